//! String and path helpers shared by the classifier, the transformer and the
//! injection engine. Everything here works on `/`-separated path strings, which
//! is the form the generated references are written in.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder replaced by the assets extension inside the start tag.
pub const EXT_PLACEHOLDER: &str = "{{ext}}";

/// A configuration value that may be written either as a single string or as a list.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Coerces an optional scalar-or-list into a list. An empty scalar yields an empty list.
pub fn to_list(value: Option<&OneOrMany>) -> Vec<String> {
    match value {
        Some(OneOrMany::One(s)) if !s.is_empty() => vec![s.clone()],
        Some(OneOrMany::Many(list)) => list.clone(),
        _ => Vec::new(),
    }
}

/// Escapes a literal so it matches itself inside a regular expression.
pub fn escape_for_regex(literal: &str) -> String {
    regex::escape(literal)
}

/// Replaces every occurrence of `placeholder` in `template` with `value`.
pub fn replace_placeholder(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(placeholder, value)
}

/// Builds the start marker for an extension, e.g. `<!-- injector:js -->`.
pub fn get_tag(template: &str, ext: &str) -> String {
    replace_placeholder(template, EXT_PLACEHOLDER, ext)
}

/// Converts Windows separators to forward slashes.
pub fn unixify(path: &str) -> String {
    path.replace('\\', "/")
}

/// Ensures the path starts with exactly one `/`.
///
/// Paths consisting only of slashes (or the empty path) are returned untouched.
pub fn add_root_slash(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return path.to_string();
    }
    format!("/{trimmed}")
}

/// Removes every leading `/`.
pub fn remove_root_slash(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

/// Strips each base path in turn when it prefixes the (already stripped) path.
pub fn remove_base_path(bases: &[String], path: &str) -> String {
    bases.iter().fold(path.to_string(), |acc, base| {
        if !base.is_empty() && acc.starts_with(base.as_str()) {
            acc[base.len()..].to_string()
        } else {
            acc
        }
    })
}

/// Extension of the file name (text after its final dot), without the dot.
///
/// Returns an empty string when the file name has no dot or only a leading one
/// (`.bowerrc`).
pub fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx + 1..],
    }
}

/// Returns the `.min` sibling of `path` when `minify` is set and that file exists.
pub fn make_minified_if_needed(minify: bool, path: &str) -> String {
    if !minify {
        return path.to_string();
    }
    let ext = extension(path);
    let min_path = if ext.is_empty() {
        format!("{path}.min")
    } else {
        format!("{}.min.{ext}", &path[..path.len() - ext.len() - 1])
    };
    if Path::new(&min_path).exists() {
        min_path
    } else {
        path.to_string()
    }
}
