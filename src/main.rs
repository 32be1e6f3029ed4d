use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::collections::BTreeMap;
use std::path::Path;

use injector::{
    load_config, run, Config, MatchMode, OneOrMany, Options, RunSummary, DEFAULT_CONFIG_FILE,
    DEFAULT_CONFIG_KEY,
};

/// Inject references to files into other files (think scripts and stylesheets into an html file)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command or target name
    command_or_target: Option<String>,

    /// Additional arguments
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,

    /// Configuration file holding the targets
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Verbose mode
    #[arg(long)]
    verbose: bool,

    /// Quiet mode
    #[arg(long)]
    quiet: bool,
}

// Reserved keywords cannot be used as target names
const RESERVED_KEYWORDS: &[&str] = &["inject", "help", "--help", "-h"];

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .init();
    } else if cli.quiet {
        env_logger::builder()
            .filter_level(LevelFilter::Error)
            .init();
    } else {
        env_logger::builder().filter_level(LevelFilter::Warn).init();
    }

    let result = match cli.command_or_target.as_deref() {
        Some("inject") => {
            let inject_cli = match InjectCli::try_parse_from(
                std::iter::once("inject").chain(cli.args.iter().map(|s| s.as_str())),
            ) {
                Ok(cli) => cli,
                Err(e) => e.exit(),
            };
            run_config(&inject_cli.into_config())
        }
        Some(reserved) if RESERVED_KEYWORDS.contains(&reserved) => Err(anyhow!(
            "'{}' is a reserved keyword and cannot be used as a target name.",
            reserved
        )),
        Some(target) => run_target(&cli.config, target),
        None => run_target(&cli.config, DEFAULT_CONFIG_KEY),
    };

    match result {
        Ok(summary) => {
            for notice in &summary.notices {
                println!("{}", notice);
            }
            for report in &summary.reports {
                println!("{}: {}", report.target.display(), report.message);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_target(config_path: &str, target: &str) -> Result<RunSummary> {
    let configs = load_config(Path::new(config_path))?;
    let config = configs
        .get(target)
        .ok_or_else(|| anyhow!("Target '{}' not found in {}", target, config_path))?;
    run_config(config).with_context(|| format!("Target '{}' failed", target))
}

fn run_config(config: &Config) -> Result<RunSummary> {
    let options = Options::from_config(config)?;
    run(&options)
}

/// CLI parser for the `inject` command
#[derive(Parser)]
struct InjectCli {
    /// Extension of the files to inject, also used in the start tag
    #[arg(short, long)]
    assets_ext: String,

    /// Files, directories or glob patterns to scan
    #[arg(short, long)]
    input: Vec<String>,

    /// File to write
    #[arg(short, long)]
    dest: Option<String>,

    /// Template to read instead of `dest`
    #[arg(short, long)]
    template: Option<String>,

    /// Bower-style manifest to pull dependencies from
    #[arg(long)]
    manifest: Option<String>,

    /// Prefix added to every manifest file
    #[arg(long)]
    manifest_prefix: Option<String>,

    /// Prefer `.min` siblings of the assets
    #[arg(long)]
    min: bool,

    /// Make asset paths relative to the written file
    #[arg(long)]
    relative: bool,

    /// Force the leading slash policy
    #[arg(long)]
    add_root_slash: Option<bool>,

    /// Prefix stripped from asset paths
    #[arg(long)]
    strip_prefix: Vec<String>,

    /// Start tag, `{{ext}}` is replaced by the assets extension
    #[arg(long)]
    starttag: Option<String>,

    /// End tag
    #[arg(long)]
    endtag: Option<String>,

    /// Removed from every rendered reference
    #[arg(long)]
    ignore_path: Option<String>,

    /// Tag template for an extension, as `ext=template`
    #[arg(long, value_parser = parse_key_value)]
    transform: Vec<(String, String)>,

    /// Skip assets that produce no reference
    #[arg(long)]
    strict: bool,

    /// Only accept start tags at the beginning of a line
    #[arg(long)]
    lines: bool,
}

impl InjectCli {
    fn into_config(self) -> Config {
        let transform: BTreeMap<String, String> = self.transform.into_iter().collect();
        Config {
            inputs: Some(self.input),
            dest: self.dest,
            template: self.template,
            assets_ext: Some(self.assets_ext),
            min: Some(self.min),
            manifest: self.manifest,
            manifest_prefix: self.manifest_prefix,
            relative: Some(self.relative),
            add_root_slash: self.add_root_slash,
            strip_prefix: Some(OneOrMany::Many(self.strip_prefix)),
            starttag: self.starttag,
            endtag: self.endtag,
            line_ending: None,
            transform: (!transform.is_empty()).then_some(transform),
            ignore_path: self.ignore_path,
            strict: Some(self.strict),
            match_mode: Some(if self.lines {
                MatchMode::Lines
            } else {
                MatchMode::Pattern
            }),
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected `ext=template`, got '{}'", s))
}
