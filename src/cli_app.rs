//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::{Colorize, control};
use thiserror::Error;

use asset_sweeper::core::config::{Config, DEFAULT_CONFIG_FILE};
use asset_sweeper::core::errors::SweepError;
use asset_sweeper::logger::activity::ActivityLogger;
use asset_sweeper::logger::jsonl::JsonlConfig;
use asset_sweeper::scanner::category::AssetCategory;
use asset_sweeper::scanner::deletion::DeletionRecord;
use asset_sweeper::sweep::{SweepReport, Sweeper};

/// Asset Sweeper: deletes image and audio files no project file mentions.
#[derive(Debug, Parser)]
#[command(
    name = "sweeper",
    author,
    version,
    about = "Delete image and audio assets that no .js/.json/.txt/.html/.css file mentions by name",
    long_about = None
)]
pub struct Cli {
    /// Override config file path (default: ./sweeper.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Project root every asset and reference directory is resolved against.
    #[arg(short = 'C', long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Append structured JSONL activity records to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Worker threads used to resolve assets.
    #[arg(short = 'j', long, value_name = "N")]
    parallelism: Option<usize>,
    /// Read each reference file once and keep its text for the whole run.
    #[arg(long)]
    cache_contents: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Print a run summary to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) => 2,
        }
    }
}

impl From<SweepError> for CliError {
    fn from(value: SweepError) -> Self {
        match value {
            SweepError::InvalidConfig { .. }
            | SweepError::MissingConfig { .. }
            | SweepError::ConfigParse { .. } => Self::User(value.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Run one sweep. Individual deletion failures are reported, not returned.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color || !io::stdout().is_terminal() {
        control::set_override(false);
    }

    let config = load_config(cli)?;

    let mut logger = config
        .paths
        .jsonl_log
        .as_ref()
        .map_or_else(ActivityLogger::disabled, |path| {
            ActivityLogger::to_jsonl(JsonlConfig::at(path))
        });

    let mut stdout = io::stdout().lock();
    let report = Sweeper::new(&config).run_with(&mut logger, |record| {
        let _ = writeln!(stdout, "{}", render_record(record));
    })?;
    let _ = stdout.flush();
    drop(stdout);

    print_diagnostics(&report);
    if cli.verbose {
        eprintln!("{}", summary_line(&report));
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let probed = cli
        .root
        .as_ref()
        .map(|root| root.join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists());
    let path: Option<&Path> = cli.config.as_deref().or(probed.as_deref());

    let mut config = Config::load(path)?;
    apply_cli_overrides(&mut config, cli);
    config.normalize();
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.paths.project_root.clone_from(root);
    }
    if let Some(path) = &cli.log_file {
        config.paths.jsonl_log = Some(path.clone());
    }
    if let Some(n) = cli.parallelism {
        config.resolver.parallelism = n;
    }
    if cli.cache_contents {
        config.resolver.cache_contents = true;
    }
}

/// Report line with the leading verb colored when colors are enabled.
fn render_record(record: &DeletionRecord) -> String {
    let line = record.to_string();
    let (verb, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
    let verb = if record.is_removed() {
        verb.green()
    } else {
        verb.red().bold()
    };
    format!("{verb} {rest}")
}

fn print_diagnostics(report: &SweepReport) {
    for skipped in &report.plan.skipped_directories {
        eprintln!(
            "[SWEEPER-WALK] skipping unreadable directory {}: {}",
            skipped.path.display(),
            skipped.error
        );
    }
    for unreadable in &report.plan.unreadable_references {
        eprintln!(
            "[SWEEPER-READ] could not read reference file {}: {}",
            unreadable.path.display(),
            unreadable.error
        );
    }
}

fn summary_line(report: &SweepReport) -> String {
    let per_category: Vec<String> = AssetCategory::ALL
        .into_iter()
        .map(|category| {
            let found = report
                .plan
                .categories
                .iter()
                .find(|c| c.category == category)
                .map_or(0, |c| c.found());
            format!(
                "{category}: {found} found, {} unused",
                report.plan.unused(category).len()
            )
        })
        .collect();
    format!(
        "[SWEEPER] {} reference files scanned; {}; {} removed, {} failed in {:.2}s",
        report.plan.references_scanned,
        per_category.join("; "),
        report.deletion.items_deleted,
        report.deletion.items_failed,
        report.duration.as_secs_f64()
    )
}
