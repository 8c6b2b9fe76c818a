//! CLI command definitions, routing, and tracing setup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use knowledgepack_artifacts::{EmitConfig, emit, validate_output};
use knowledgepack_core::{ConsolidationReport, Consolidator, ProgressReporter};
use knowledgepack_shared::{
    AppConfig, Framework, OutputCategory, WordEstimate, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// knowledgepack: turn a knowledge corpus into upload-ready documents.
#[derive(Parser)]
#[command(
    name = "knowledgepack",
    version,
    about = "Consolidate classified knowledge fragments into a bounded set of upload-ready files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.knowledgepack/knowledgepack.toml.
    #[arg(long, global = true, env = "KNOWLEDGEPACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Consolidate a fragment file into upload-ready documents.
    Consolidate {
        /// Fragment records (.json array or .jsonl lines).
        fragments: PathBuf,

        /// Pre-built framework records; skips isolation.
        #[arg(long)]
        frameworks: Option<PathBuf>,

        /// Output directory (defaults to `[output] output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Target number of output documents.
        #[arg(long)]
        target: Option<usize>,

        /// Skip framework isolation.
        #[arg(long)]
        no_isolation: bool,

        /// Keep framework-captured fragments out of ordinary documents.
        #[arg(long)]
        exclude_framework_fragments: bool,
    },

    /// Check an output directory against its upload manifest.
    Validate {
        /// Output directory written by `consolidate`.
        dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "knowledgepack=info",
        1 => "knowledgepack=debug",
        _ => "knowledgepack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Consolidate {
            fragments,
            frameworks,
            out,
            target,
            no_isolation,
            exclude_framework_fragments,
        } => {
            let mut config = resolve_config(config_path.as_deref())?;
            if let Some(target) = target {
                config.consolidation.target_file_count = target;
            }
            if no_isolation {
                config.isolation.enabled = false;
            }
            if exclude_framework_fragments {
                config.consolidation.exclude_framework_fragments = true;
            }
            cmd_consolidate(&config, &fragments, frameworks.as_deref(), out)
        }
        Command::Validate { dir } => cmd_validate(&dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_consolidate(
    config: &AppConfig,
    fragments_path: &Path,
    frameworks_path: Option<&Path>,
    out: Option<PathBuf>,
) -> Result<()> {
    let counter = WordEstimate::default();
    let output_root = out.unwrap_or_else(|| PathBuf::from(&config.output.output_dir));

    info!(
        fragments = %fragments_path.display(),
        out = %output_root.display(),
        target = config.consolidation.target_file_count,
        "consolidating corpus"
    );

    let fragments = knowledgepack_intake::load_fragments(fragments_path, &counter)?;

    let frameworks: BTreeMap<String, Framework> = match frameworks_path {
        Some(path) => knowledgepack_intake::load_frameworks(path)?,
        None if config.isolation.enabled => knowledgepack_frameworks::isolate_frameworks(
            &fragments,
            &config.frameworks,
            config.isolation.discover_patterns,
        ),
        None => BTreeMap::new(),
    };

    let consolidator = Consolidator::new(config.consolidation, counter)?;
    let reporter = CliProgress::new();
    let consolidation = consolidator.consolidate(&fragments, &frameworks, &reporter)?;

    let emit_config = EmitConfig {
        output_root,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let emitted = emit(&emit_config, &consolidation)?;

    // Print summary
    let report = &consolidation.report;
    println!();
    println!("  Consolidation complete!");
    println!("  Fragments:  {}", report.input_fragments);
    println!("  Duplicates: {}", report.dedup.removed);
    println!("  Frameworks: {}", report.framework_documents);
    for category in OutputCategory::ALL {
        let count = report.documents_by_category.get(&category).copied().unwrap_or(0);
        println!("  {:<12}{count}", format!("{category}:"));
    }
    println!("  Files:      {}", emitted.file_count());
    println!("  Tokens:     {}", report.total_tokens);
    if let Some(rate) = report.preservation.preservation_rate {
        println!("  Preserved:  {:.1}%", rate * 100.0);
    }
    println!("  Path:       {}", emitted.output_root.display());
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
    println!();

    Ok(())
}

fn cmd_validate(dir: &Path) -> Result<()> {
    let manifest = validate_output(dir)?;
    println!(
        "{}: {} files, {} tokens, checksums match",
        dir.display(),
        manifest.statistics.total_files,
        manifest.statistics.total_tokens
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config).map_err(|e| eyre!("cannot render config: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn category_merged(&self, category: OutputCategory, documents: usize) {
        self.spinner
            .set_message(format!("Merged {category}: {documents} documents"));
    }

    fn done(&self, _report: &ConsolidationReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn consolidate_flags_parse() {
        let cli = Cli::try_parse_from([
            "knowledgepack",
            "consolidate",
            "fragments.jsonl",
            "--target",
            "40",
            "--no-isolation",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Consolidate {
                fragments,
                target,
                no_isolation,
                exclude_framework_fragments,
                ..
            } => {
                assert_eq!(fragments, PathBuf::from("fragments.jsonl"));
                assert_eq!(target, Some(40));
                assert!(no_isolation);
                assert!(!exclude_framework_fragments);
            }
            _ => panic!("expected consolidate"),
        }
    }

    #[test]
    fn log_format_accepts_json() {
        let cli = Cli::try_parse_from(["knowledgepack", "--log-format", "json", "config", "show"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
