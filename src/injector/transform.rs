//! Reference strategies: how an asset path becomes the markup that gets injected.

use crate::injector::traits::Transform;
use crate::injector::utils::{extension, replace_placeholder};
use log::{debug, warn};
use std::collections::BTreeMap;

/// An asset path together with the text rendered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub original: String,
    /// `None` when the transform produced nothing for this asset.
    pub transformed: Option<String>,
}

impl AssetReference {
    /// The line written into the region. A missing reference renders as an empty line.
    pub fn text(&self) -> &str {
        self.transformed.as_deref().unwrap_or("")
    }
}

/// Built-in strategy keyed on the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionTransform;

impl Transform for ExtensionTransform {
    fn transform(&self, path: &str, _index: usize, _total: usize) -> Option<String> {
        match extension(path) {
            "css" => Some(format!(r#"<link rel="stylesheet" href="{path}">"#)),
            "js" => Some(format!(r#"<script src="{path}"></script>"#)),
            "html" => Some(format!(r#"<link rel="import" href="{path}">"#)),
            _ => None,
        }
    }
}

/// User supplied mapping from extension to a tag template.
///
/// Templates may reference `{{path}}`, `{{index}}` and `{{total}}`.
#[derive(Debug, Clone, Default)]
pub struct TemplateTransform {
    templates: BTreeMap<String, String>,
}

impl TemplateTransform {
    pub fn new(templates: BTreeMap<String, String>) -> Self {
        Self { templates }
    }
}

impl Transform for TemplateTransform {
    fn transform(&self, path: &str, index: usize, total: usize) -> Option<String> {
        let template = self.templates.get(extension(path))?;
        let rendered = replace_placeholder(template, "{{path}}", path);
        let rendered = replace_placeholder(&rendered, "{{index}}", &index.to_string());
        Some(replace_placeholder(&rendered, "{{total}}", &total.to_string()))
    }
}

/// Adapts a closure into a [`Transform`].
pub struct FnTransform<F>(pub F);

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str, usize, usize) -> Option<String>,
{
    fn transform(&self, path: &str, index: usize, total: usize) -> Option<String> {
        (self.0)(path, index, total)
    }
}

/// Runs every asset through `transform` and removes the first occurrence of
/// `ignore_path` from the rendered text.
///
/// With `strict` set, assets the transform has nothing for are dropped;
/// otherwise they are kept and later render as empty lines.
pub fn build_references(
    assets: &[String],
    transform: &dyn Transform,
    ignore_path: Option<&str>,
    strict: bool,
) -> Vec<AssetReference> {
    let total = assets.len();
    assets
        .iter()
        .enumerate()
        .filter_map(|(index, original)| {
            let transformed = transform
                .transform(original, index, total)
                .map(|text| match ignore_path {
                    Some(ignore) if !ignore.is_empty() => text.replacen(ignore, "", 1),
                    _ => text,
                });

            match &transformed {
                Some(text) => debug!("Transformed {:?} into {:?}", original, text),
                None => warn!("No reference produced for {:?}", original),
            }

            if strict && transformed.is_none() {
                return None;
            }
            Some(AssetReference {
                original: original.clone(),
                transformed,
            })
        })
        .collect()
}
