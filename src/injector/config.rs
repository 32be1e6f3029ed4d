//! Holds the configuration structure (`Config`), loading of `injector.yaml`, and
//! resolution of a target's configuration into the `Options` used for a run.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use crate::injector::inject_code::MatchMode;
use crate::injector::traits::Transform;
use crate::injector::transform::{ExtensionTransform, TemplateTransform};
use crate::injector::utils::{to_list, OneOrMany};

pub const DEFAULT_CONFIG_FILE: &str = "injector.yaml";
pub const DEFAULT_CONFIG_KEY: &str = "base";
pub const DEFAULT_STARTTAG: &str = "<!-- injector:{{ext}} -->";
pub const DEFAULT_ENDTAG: &str = "<!-- endinjector -->";
pub const DEFAULT_LINE_ENDING: &str = "\n";

/// One injection target as written in `injector.yaml`. Every field is optional;
/// unset fields fall back to the `base` target and then to built-in defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Files, directories or glob patterns to scan.
    pub inputs: Option<Vec<String>>,
    /// File written with the injected template.
    pub dest: Option<String>,
    /// Template read when writing `dest`. Without it `dest` is rewritten in place.
    pub template: Option<String>,
    /// Extension of the asset files; also substituted into the start tag.
    pub assets_ext: Option<String>,
    /// Prefer `name.min.ext` siblings when they exist.
    pub min: Option<bool>,
    /// Bower-style manifest whose dependencies are added to the assets.
    pub manifest: Option<String>,
    /// Prefix prepended to every file coming from the manifest.
    pub manifest_prefix: Option<String>,
    /// Make asset paths relative to the written file.
    pub relative: Option<bool>,
    pub add_root_slash: Option<bool>,
    /// Prefixes stripped from asset paths; a single string or a list.
    pub strip_prefix: Option<OneOrMany>,
    pub starttag: Option<String>,
    pub endtag: Option<String>,
    pub line_ending: Option<String>,
    /// Extension to tag template mapping replacing the built-in tags.
    pub transform: Option<BTreeMap<String, String>>,
    /// Removed (first occurrence) from every rendered reference.
    pub ignore_path: Option<String>,
    /// Drop assets the transform produces nothing for instead of writing empty lines.
    pub strict: Option<bool>,
    pub match_mode: Option<MatchMode>,
}

// Valid Config field names, used to tell a single config from a map of named configs.
const CONFIG_FIELDS: &[&str] = &[
    "inputs",
    "dest",
    "template",
    "assets_ext",
    "min",
    "manifest",
    "manifest_prefix",
    "relative",
    "add_root_slash",
    "strip_prefix",
    "starttag",
    "endtag",
    "line_ending",
    "transform",
    "ignore_path",
    "strict",
    "match_mode",
];

macro_rules! inherit {
    ($target:ident, $base:ident, $($field:ident),+ $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $base.$field.clone();
            }
        )+
    };
}

impl Config {
    /// Fills every unset field from `base`.
    pub fn merged_over(self, base: &Config) -> Config {
        let mut merged = self;
        inherit!(
            merged,
            base,
            inputs,
            dest,
            template,
            assets_ext,
            min,
            manifest,
            manifest_prefix,
            relative,
            add_root_slash,
            strip_prefix,
            starttag,
            endtag,
            line_ending,
            transform,
            ignore_path,
            strict,
            match_mode,
        );
        merged
    }
}

/// Loads configurations from a YAML file.
///
/// The file can contain a single configuration (stored under `base`), a map of
/// named configurations, or both: top-level config fields form `base` and the
/// remaining keys are named targets. Named targets inherit unset fields from `base`.
pub fn load_config(config_path: &Path) -> Result<HashMap<String, Config>> {
    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: '{}'", config_path.display()))?;
    parse_config(&contents)
        .with_context(|| format!("Failed to parse config file: '{}'", config_path.display()))
}

/// Parses the contents of a configuration file. See [`load_config`].
pub fn parse_config(contents: &str) -> Result<HashMap<String, Config>> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(contents)?;
    let mapping = yaml_value
        .as_mapping()
        .ok_or_else(|| anyhow!("configuration must contain a mapping at the top level"))?;

    let mut base_map = serde_yaml::Mapping::new();
    let mut named = HashMap::new();

    for (key, value) in mapping {
        let key_str = key
            .as_str()
            .ok_or_else(|| anyhow!("configuration keys must be strings, found {:?}", key))?;
        if CONFIG_FIELDS.contains(&key_str) {
            base_map.insert(key.clone(), value.clone());
        } else {
            let config: Config = serde_yaml::from_value(value.clone())
                .with_context(|| format!("Invalid configuration for target '{}'", key_str))?;
            named.insert(key_str.to_string(), config);
        }
    }

    let base: Config = if base_map.is_empty() {
        named.remove(DEFAULT_CONFIG_KEY).unwrap_or_default()
    } else {
        if named.contains_key(DEFAULT_CONFIG_KEY) {
            bail!(
                "'{}' is defined both by top-level fields and as a named target",
                DEFAULT_CONFIG_KEY
            );
        }
        serde_yaml::from_value(serde_yaml::Value::Mapping(base_map))?
    };

    let mut configs: HashMap<String, Config> = named
        .into_iter()
        .map(|(name, config)| (name, config.merged_over(&base)))
        .collect();
    configs.insert(DEFAULT_CONFIG_KEY.to_string(), base);
    Ok(configs)
}

/// Fully resolved settings for one run.
pub struct Options {
    pub inputs: Vec<String>,
    pub dest: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub assets_ext: String,
    pub min: bool,
    pub manifest: Option<PathBuf>,
    pub manifest_prefix: Option<String>,
    pub relative: bool,
    pub add_root_slash: bool,
    pub strip_prefix: Vec<String>,
    pub starttag: String,
    pub endtag: String,
    pub line_ending: String,
    pub ignore_path: Option<String>,
    pub strict: bool,
    pub match_mode: MatchMode,
    pub transform: Box<dyn Transform>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("inputs", &self.inputs)
            .field("dest", &self.dest)
            .field("template", &self.template)
            .field("assets_ext", &self.assets_ext)
            .field("min", &self.min)
            .field("manifest", &self.manifest)
            .field("relative", &self.relative)
            .field("add_root_slash", &self.add_root_slash)
            .field("starttag", &self.starttag)
            .field("endtag", &self.endtag)
            .field("strict", &self.strict)
            .field("match_mode", &self.match_mode)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Options with built-in defaults for the given assets extension.
    ///
    /// An empty extension is only rejected once the run classifies its inputs.
    pub fn new(assets_ext: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            dest: None,
            template: None,
            assets_ext: assets_ext.into(),
            min: false,
            manifest: None,
            manifest_prefix: None,
            relative: false,
            add_root_slash: true,
            strip_prefix: Vec::new(),
            starttag: DEFAULT_STARTTAG.to_string(),
            endtag: DEFAULT_ENDTAG.to_string(),
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            ignore_path: None,
            strict: false,
            match_mode: MatchMode::default(),
            transform: Box::new(ExtensionTransform),
        }
    }

    /// Resolves a configuration against the built-in defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        let assets_ext = config
            .assets_ext
            .clone()
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| anyhow!("Missing required option `assets_ext`"))?;

        let relative = config.relative.unwrap_or(false);
        let transform: Box<dyn Transform> = match &config.transform {
            Some(templates) => Box::new(TemplateTransform::new(templates.clone())),
            None => Box::new(ExtensionTransform),
        };

        Ok(Self {
            inputs: config.inputs.clone().unwrap_or_default(),
            dest: config.dest.as_ref().map(PathBuf::from),
            template: config.template.as_ref().map(PathBuf::from),
            assets_ext,
            min: config.min.unwrap_or(false),
            manifest: config.manifest.as_ref().map(PathBuf::from),
            manifest_prefix: config.manifest_prefix.clone(),
            relative,
            add_root_slash: config.add_root_slash.unwrap_or(!relative),
            strip_prefix: to_list(config.strip_prefix.as_ref()),
            starttag: config
                .starttag
                .clone()
                .unwrap_or_else(|| DEFAULT_STARTTAG.to_string()),
            endtag: config
                .endtag
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDTAG.to_string()),
            line_ending: config
                .line_ending
                .clone()
                .unwrap_or_else(|| DEFAULT_LINE_ENDING.to_string()),
            ignore_path: config.ignore_path.clone(),
            strict: config.strict.unwrap_or(false),
            match_mode: config.match_mode.unwrap_or_default(),
            transform,
        })
    }

    /// Replaces the transform strategy.
    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }
}
