//! Drives one injection run: expands the inputs, adds manifest dependencies,
//! classifies, prepares and transforms the asset paths once, then injects the
//! references into every target in order.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::injector::classify::classify;
use crate::injector::config::Options;
use crate::injector::inject_code::{InjectionReport, Injector, MarkerPair};
use crate::injector::manifest::load_manifest_files;
use crate::injector::traits::InjectOperation;
use crate::injector::transform::{build_references, AssetReference};
use crate::injector::utils::{
    add_root_slash, make_minified_if_needed, remove_base_path, remove_root_slash, unixify,
};

/// What a run did: the prepared asset paths and one report per target, in order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub assets: Vec<String>,
    pub reports: Vec<InjectionReport>,
    /// Advisories meant for the user, printed before the reports.
    pub notices: Vec<String>,
}

impl RunSummary {
    pub fn changed(&self) -> usize {
        self.reports.iter().filter(|r| r.changed).count()
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expands input entries: glob patterns and directories become the files they
/// match (sorted), anything else is kept as given.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for input in inputs {
        if is_glob(input) {
            let entries = glob::glob(input)
                .with_context(|| format!("Invalid input pattern: '{}'", input))?;
            for entry in entries {
                let path = entry.with_context(|| format!("Failed to expand '{}'", input))?;
                if path.is_file() {
                    files.push(unixify(&path.to_string_lossy()));
                }
            }
        } else if Path::new(input).is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to walk '{}'", input))?;
                if entry.file_type().is_file() {
                    files.push(unixify(&entry.path().to_string_lossy()));
                }
            }
        } else {
            files.push(unixify(input));
        }
    }
    debug!("Expanded {} input(s) into {} file(s)", inputs.len(), files.len());
    Ok(files)
}

/// Directory (with trailing slash) that relative asset paths are computed from.
fn relative_base(options: &Options) -> Option<String> {
    if !options.relative {
        return None;
    }
    let written = options.dest.as_ref().or(options.template.as_ref())?;
    let parent = unixify(&written.parent()?.to_string_lossy());
    if parent.is_empty() {
        None
    } else {
        Some(format!("{}/", parent.trim_end_matches('/')))
    }
}

/// Normalizes one asset path according to the options.
pub fn prepare_asset_path(path: &str, options: &Options) -> String {
    let path = make_minified_if_needed(options.min, &unixify(path));
    let mut path = remove_base_path(&options.strip_prefix, &path);
    if let Some(base) = relative_base(options) {
        path = remove_base_path(&[base], &path);
    }
    if options.add_root_slash {
        add_root_slash(&path)
    } else {
        remove_root_slash(&path)
    }
}

/// Files from the configured manifest that match the assets extension.
fn manifest_assets(options: &Options) -> Result<Vec<String>> {
    let Some(manifest) = &options.manifest else {
        return Ok(Vec::new());
    };
    let prefix = options.manifest_prefix.as_deref().unwrap_or("");
    let files: Vec<String> = load_manifest_files(manifest)?
        .into_iter()
        .map(|file| format!("{prefix}{file}"))
        .collect();
    let classified = classify(&files, &options.assets_ext)?;
    if !classified.templates.is_empty() {
        debug!(
            "Skipping {} manifest file(s) not matching {:?}",
            classified.templates.len(),
            options.assets_ext
        );
    }
    Ok(classified.assets)
}

/// Every (source, destination) pair to inject into, without duplicates.
fn targets(options: &Options, templates: Vec<String>) -> Vec<(PathBuf, PathBuf)> {
    let mut targets: Vec<(PathBuf, PathBuf)> = templates
        .into_iter()
        .map(|t| (PathBuf::from(&t), PathBuf::from(t)))
        .collect();

    let extra = match (&options.template, &options.dest) {
        (Some(template), Some(dest)) => Some((template.clone(), dest.clone())),
        (Some(template), None) => Some((template.clone(), template.clone())),
        (None, Some(dest)) => Some((dest.clone(), dest.clone())),
        (None, None) => None,
    };
    if let Some(pair) = extra {
        if !targets.contains(&pair) {
            targets.push(pair);
        }
    }
    targets
}

/// Assets of a run with their rendered references, and the templates found among the inputs.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub assets: Vec<String>,
    pub references: Vec<AssetReference>,
    pub templates: Vec<String>,
}

/// Collects the assets of a run and renders their references.
pub fn collect_references(options: &Options) -> Result<Collected> {
    let inputs = expand_inputs(&options.inputs)?;
    let classified = classify(&inputs, &options.assets_ext)?;

    let assets: Vec<String> = manifest_assets(options)?
        .iter()
        .chain(classified.assets.iter())
        .map(|path| prepare_asset_path(path, options))
        .collect();

    let references = build_references(
        &assets,
        options.transform.as_ref(),
        options.ignore_path.as_deref(),
        options.strict,
    );
    Ok(Collected {
        assets,
        references,
        templates: classified.templates,
    })
}

/// Runs one injection with the given options.
pub fn run(options: &Options) -> Result<RunSummary> {
    let mut notices = Vec::new();
    if options.template.is_none() {
        let notice = "Missing option `template`, using `dest` as template instead".to_string();
        info!("{}", notice);
        notices.push(notice);
    }

    let Collected {
        assets,
        references,
        templates,
    } = collect_references(options)?;
    let injector = Injector::new(
        MarkerPair::new(&options.starttag, &options.assets_ext, &options.endtag),
        options.line_ending.as_str(),
        options.match_mode,
    );

    let mut reports = Vec::new();
    for (source, destination) in targets(options, templates) {
        reports.push(injector.inject(&source, &destination, &references)?);
    }

    Ok(RunSummary {
        assets,
        reports,
        notices,
    })
}
