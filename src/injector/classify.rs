//! Splits the input list into asset files and template files.

use anyhow::{ensure, Context, Result};
use regex::Regex;

use crate::injector::utils::escape_for_regex;

/// Result of [`classify`]. Both lists keep the relative order of the input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classified {
    pub assets: Vec<String>,
    pub templates: Vec<String>,
}

/// Builds the asset filter: any character followed by the extension at the end of the path.
pub fn assets_filter(assets_ext: &str) -> Result<Regex> {
    ensure!(!assets_ext.is_empty(), "Missing required option `assets_ext`");
    let pattern = format!(".{}$", escape_for_regex(assets_ext));
    Regex::new(&pattern).with_context(|| format!("Invalid assets extension filter: {pattern:?}"))
}

/// Paths matching the assets filter become assets, everything else a template.
pub fn classify<S: AsRef<str>>(paths: &[S], assets_ext: &str) -> Result<Classified> {
    let filter = assets_filter(assets_ext)?;
    let (assets, templates): (Vec<String>, Vec<String>) = paths
        .iter()
        .map(|p| p.as_ref().to_string())
        .partition(|p| filter.is_match(p));
    Ok(Classified { assets, templates })
}
