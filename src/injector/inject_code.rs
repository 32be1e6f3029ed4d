//! Rewrites the marker-delimited regions of template files with the rendered
//! asset references.

use crate::injector::traits::InjectOperation;
use crate::injector::transform::AssetReference;
use crate::injector::utils::{escape_for_regex, get_tag};
use anyhow::{ensure, Context, Error, Result};
use log::{debug, info};
use rand::distr::Alphanumeric;
use rand::rngs::ThreadRng;
use rand::Rng;
use regex::{Captures, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// How marker regions are located inside a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Case-insensitive pattern match anywhere in the file.
    #[default]
    Pattern,
    /// Only start markers that begin a line (after indentation) open a region.
    Lines,
}

/// Start and end literals bracketing an injectable region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

impl MarkerPair {
    /// Substitutes `ext` into the start tag template.
    pub fn new(starttag: &str, ext: &str, endtag: &str) -> Self {
        Self {
            start: get_tag(starttag, ext),
            end: endtag.to_string(),
        }
    }
}

/// Content after injection and the number of regions that were rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub content: String,
    pub regions: usize,
}

/// Outcome of injecting into one template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionReport {
    pub target: PathBuf,
    pub changed: bool,
    pub regions: usize,
    pub injected: usize,
    pub message: String,
}

/// Joins the references so that each sits on its own line at `indent`, with an
/// empty entry on both ends so the markers stay on their own lines.
fn indented_block(references: &[AssetReference], indent: &str, line_ending: &str) -> String {
    let mut lines = Vec::with_capacity(references.len() + 2);
    lines.push("");
    lines.extend(references.iter().map(AssetReference::text));
    lines.push("");
    let separator = format!("{line_ending}{indent}");
    lines.join(separator.as_str())
}

/// Rewrites every region of `content` delimited by `markers`.
pub fn inject_content(
    content: &str,
    markers: &MarkerPair,
    references: &[AssetReference],
    line_ending: &str,
    mode: MatchMode,
) -> Result<Injection> {
    ensure!(
        !markers.start.is_empty() && !markers.end.is_empty(),
        "Start and end tags must not be empty"
    );
    match mode {
        MatchMode::Pattern => inject_with_pattern(content, markers, references, line_ending),
        MatchMode::Lines => Ok(inject_with_lines(content, markers, references, line_ending)),
    }
}

fn inject_with_pattern(
    content: &str,
    markers: &MarkerPair,
    references: &[AssetReference],
    line_ending: &str,
) -> Result<Injection> {
    let pattern = format!(
        r"([\t ]*)({})(?s:.*?)({})",
        escape_for_regex(&markers.start),
        escape_for_regex(&markers.end)
    );
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Failed to build injector pattern: {pattern:?}"))?;

    let mut regions = 0;
    let replaced = re.replace_all(content, |caps: &Captures| {
        regions += 1;
        let indent = &caps[1];
        format!(
            "{}{}{}{}",
            indent,
            &caps[2],
            indented_block(references, indent, line_ending),
            &caps[3]
        )
    });

    Ok(Injection {
        content: replaced.into_owned(),
        regions,
    })
}

/// Offset where the indentation in front of `marker_at` begins, provided
/// nothing but spaces and tabs separate the marker from the start of its line.
fn line_indent_start(content: &str, marker_at: usize) -> Option<usize> {
    let before = &content[..marker_at];
    let indent_at = before.trim_end_matches([' ', '\t']).len();
    match before[..indent_at].chars().last() {
        None | Some('\n') | Some('\r') => Some(indent_at),
        _ => None,
    }
}

/// Line oriented scanner. Marker comparison folds ASCII case only.
fn inject_with_lines(
    content: &str,
    markers: &MarkerPair,
    references: &[AssetReference],
    line_ending: &str,
) -> Injection {
    // ASCII lowercasing keeps byte offsets identical to `content`.
    let haystack = content.to_ascii_lowercase();
    let start = markers.start.to_ascii_lowercase();
    let end = markers.end.to_ascii_lowercase();

    let mut output = String::with_capacity(content.len());
    let mut cursor = 0;
    let mut search = 0;
    let mut regions = 0;

    while let Some(found) = haystack[search..].find(&start) {
        let start_at = search + found;
        let body_at = start_at + start.len();

        let Some(indent_at) = line_indent_start(content, start_at) else {
            search = body_at;
            continue;
        };
        let Some(end_found) = haystack[body_at..].find(&end) else {
            break;
        };
        let end_at = body_at + end_found;
        let after_end = end_at + end.len();
        let indent = &content[indent_at..start_at];

        output.push_str(&content[cursor..indent_at]);
        output.push_str(indent);
        output.push_str(&content[start_at..body_at]);
        output.push_str(&indented_block(references, indent, line_ending));
        output.push_str(&content[end_at..after_end]);

        cursor = after_end;
        search = after_end;
        regions += 1;
    }
    output.push_str(&content[cursor..]);

    Injection {
        content: output,
        regions,
    }
}

/// Struct for implementing the InjectOperation trait.
#[derive(Debug, Clone)]
pub struct Injector {
    markers: MarkerPair,
    line_ending: String,
    mode: MatchMode,
}

impl Injector {
    pub fn new(markers: MarkerPair, line_ending: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            markers,
            line_ending: line_ending.into(),
            mode,
        }
    }

    pub fn markers(&self) -> &MarkerPair {
        &self.markers
    }
}

impl InjectOperation for Injector {
    fn inject(
        &self,
        source: &Path,
        destination: &Path,
        references: &[AssetReference],
    ) -> Result<InjectionReport, Error> {
        let bytes = fs::read(source)
            .with_context(|| format!("Failed to read template file: '{}'", source.display()))?;
        let original = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!("Skipping non-text file {:?}", source);
                return Ok(InjectionReport {
                    target: destination.to_path_buf(),
                    changed: false,
                    regions: 0,
                    injected: 0,
                    message: "Nothing changed".to_string(),
                });
            }
        };

        let injection = inject_content(
            &original,
            &self.markers,
            references,
            &self.line_ending,
            self.mode,
        )
        .with_context(|| format!("Failed to inject into '{}'", source.display()))?;
        debug!(
            "Found {} region(s) for {:?} in {:?}",
            injection.regions, self.markers.start, source
        );

        let current = if source == destination {
            Some(original)
        } else {
            fs::read_to_string(destination).ok()
        };
        let changed = current.as_deref() != Some(injection.content.as_str());

        let message = if changed {
            write_atomically(destination, &injection.content)?;
            let message = format!(
                "Injecting {} files ({} files)",
                destination.display(),
                references.len()
            );
            info!("{}", message);
            message
        } else {
            info!("Nothing changed in {:?}", destination);
            "Nothing changed".to_string()
        };

        Ok(InjectionReport {
            target: destination.to_path_buf(),
            changed,
            regions: injection.regions,
            injected: references.len(),
            message,
        })
    }
}

/// Writes `content` to a random sibling file first, then renames it over `path`.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("Could not extract filename from path: {:?}", path))?;

    let mut rng = ThreadRng::default();
    let random_string: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        file_name.to_string_lossy(),
        random_string
    ));

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write to temporary file: {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename temporary file {:?} to {:?}", temp_path, path)
    })?;
    Ok(())
}
