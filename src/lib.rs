//! Injects references to asset files (scripts, stylesheets, imports) into the
//! marker-delimited regions of template files.

pub mod injector;

pub use injector::classify::{classify, Classified};
pub use injector::config::{
    load_config, parse_config, Config, Options, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_KEY,
};
pub use injector::inject_code::{
    inject_content, Injection, InjectionReport, Injector, MarkerPair, MatchMode,
};
pub use injector::manifest::{
    load_manifest, load_manifest_files, resolve_components_dir, ComponentsDir, ManifestFiles,
};
pub use injector::run::{run, RunSummary};
pub use injector::traits::{InjectOperation, Transform};
pub use injector::utils::OneOrMany;
pub use injector::transform::{
    build_references, AssetReference, ExtensionTransform, FnTransform, TemplateTransform,
};
