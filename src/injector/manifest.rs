//! Collects stylesheet and script files from a bower-style dependency manifest.
//!
//! Packages live in a components directory next to the manifest
//! (`bower_components` unless a sibling `.bowerrc` names another one). Each
//! package is resolved after its own dependencies, and contributes the files
//! listed in its `main` field.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::injector::utils::{extension, to_list, unixify, OneOrMany};

pub const DEFAULT_COMPONENTS_DIR: &str = "bower_components";
pub const OVERRIDE_FILE: &str = ".bowerrc";

/// Package manifests looked up inside a component directory, first match wins.
const PACKAGE_MANIFESTS: &[&str] = &[".bower.json", "bower.json", "package.json"];

/// Where packages are installed, and whether the default location was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentsDir {
    pub path: PathBuf,
    pub used_default: bool,
}

/// Files pulled from the manifest, grouped by kind in resolution order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestFiles {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl ManifestFiles {
    /// Flattens to stylesheets first, then scripts.
    pub fn into_paths(self) -> Vec<String> {
        self.css.into_iter().chain(self.js).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct OverrideConfig {
    directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    main: Option<OneOrMany>,
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    overrides: HashMap<String, PackageOverride>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct PackageOverride {
    main: Option<OneOrMany>,
    dependencies: Option<Map<String, Value>>,
}

/// Resolves the components directory for `manifest`.
///
/// A missing `.bowerrc`, one that cannot be read or parsed, or one without a
/// `directory` all fall back to the default.
pub fn resolve_components_dir(manifest: &Path) -> ComponentsDir {
    let base = manifest.parent().unwrap_or_else(|| Path::new(""));
    let override_file = base.join(OVERRIDE_FILE);

    if override_file.exists() {
        match read_override(&override_file) {
            Ok(Some(directory)) => {
                return ComponentsDir {
                    path: base.join(directory),
                    used_default: false,
                };
            }
            Ok(None) => debug!("{:?} does not name a directory", override_file),
            Err(e) => debug!("Ignoring unreadable {:?}: {:#}", override_file, e),
        }
    }

    ComponentsDir {
        path: base.join(DEFAULT_COMPONENTS_DIR),
        used_default: true,
    }
}

fn read_override(path: &Path) -> Result<Option<String>> {
    let contents = fs::read_to_string(path)?;
    let config: OverrideConfig = serde_json::from_str(&contents)?;
    Ok(config.directory.filter(|d| !d.is_empty()))
}

fn read_package(path: &Path) -> Result<PackageManifest> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse manifest: '{}'", path.display()))
}

/// Reads `manifest` and returns the css and js files of its dependency graph.
pub fn load_manifest(manifest: &Path) -> Result<ManifestFiles> {
    let root = read_package(manifest)?;
    let components = resolve_components_dir(manifest);
    debug!("Resolving packages from {:?}", components.path);

    let mut resolver = Resolver {
        components: &components.path,
        overrides: &root.overrides,
        visited: HashSet::new(),
        files: ManifestFiles::default(),
    };
    for name in root.dependencies.keys() {
        resolver.visit(name);
    }
    Ok(resolver.files)
}

/// [`load_manifest`] flattened into a single ordered list.
pub fn load_manifest_files(manifest: &Path) -> Result<Vec<String>> {
    Ok(load_manifest(manifest)?.into_paths())
}

struct Resolver<'a> {
    components: &'a Path,
    overrides: &'a HashMap<String, PackageOverride>,
    visited: HashSet<String>,
    files: ManifestFiles,
}

impl Resolver<'_> {
    fn visit(&mut self, name: &str) {
        if !self.visited.insert(name.to_string()) {
            return;
        }

        let dir = self.components.join(name);
        if !dir.is_dir() {
            warn!("Package {:?} is not installed in {:?}", name, self.components);
            return;
        }

        let mut package = match PACKAGE_MANIFESTS
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
        {
            Some(path) => match read_package(&path) {
                Ok(package) => package,
                Err(e) => {
                    warn!("Skipping package {:?}: {:#}", name, e);
                    return;
                }
            },
            None => PackageManifest::default(),
        };

        if let Some(overridden) = self.overrides.get(name) {
            if let Some(main) = &overridden.main {
                package.main = Some(main.clone());
            }
            if let Some(dependencies) = &overridden.dependencies {
                package.dependencies = dependencies.clone();
            }
        }

        for dependency in package.dependencies.keys() {
            self.visit(dependency);
        }

        let main = to_list(package.main.as_ref());
        if main.is_empty() {
            warn!("Package {:?} does not declare any main files", name);
        }
        for file in main {
            let file = file.trim_start_matches("./");
            let path = unixify(&dir.join(file).to_string_lossy());
            match extension(&path) {
                "css" => self.files.css.push(path),
                "js" => self.files.js.push(path),
                _ => debug!("Ignoring {:?} from package {:?}", path, name),
            }
        }
    }
}
