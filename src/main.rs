//! @ai:module:intent CLI for codebase quality comparison
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codebench::{
    benchmarks::BenchmarkRegistry,
    compare::Comparison,
    config::CompareConfig,
    history::HistoryStore,
    metrics::{ComparisonRecord, Winner},
    report::ReportGenerator,
    toolchain::{install_hint, SystemToolRunner, ToolchainValidator},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_FILE: &str = "codebench.toml";

#[derive(Parser)]
#[command(name = "codebench")]
#[command(about = "Compare the quality of two codebases across independent dimensions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two codebases
    Compare {
        /// Path to the first codebase
        #[arg(short = '1', long)]
        codebase1: PathBuf,

        /// Path to the second codebase
        #[arg(short = '2', long)]
        codebase2: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dimension weights as JSON, e.g. '{"Security": 2.0}'
        #[arg(long)]
        weights: Option<String>,

        /// Dimensions to skip (comma-separated)
        #[arg(long)]
        skip: Option<String>,

        /// Script run repeatedly to profile performance
        #[arg(long, env = "BENCH_PROFILE_SCRIPT")]
        profile: Option<PathBuf>,

        /// Running web application to scan dynamically
        #[arg(long, env = "BENCH_WEB_APP_URL")]
        web_app_url: Option<String>,

        /// Write the JSON export to this path
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write a Markdown report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Do not save the run to the history database
        #[arg(long)]
        no_history: bool,

        /// Print every details line per dimension
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show recent comparison runs
    History {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Report which analyzer tools are installed
    Tools,

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

struct CompareArgs {
    codebase1: PathBuf,
    codebase2: PathBuf,
    config: Option<PathBuf>,
    weights: Option<String>,
    skip: Option<String>,
    profile: Option<PathBuf>,
    web_app_url: Option<String>,
    export: Option<PathBuf>,
    report: Option<PathBuf>,
    no_history: bool,
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = match &cli.command {
        Commands::Compare { verbose: true, .. } => "codebench=debug",
        _ => "codebench=info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let result = match cli.command {
        Commands::Compare {
            codebase1,
            codebase2,
            config,
            weights,
            skip,
            profile,
            web_app_url,
            export,
            report,
            no_history,
            verbose,
        } => {
            run_compare(CompareArgs {
                codebase1,
                codebase2,
                config,
                weights,
                skip,
                profile,
                web_app_url,
                export,
                report,
                no_history,
                verbose,
            })
            .await
        }
        Commands::History { config, limit } => show_history(config, limit),
        Commands::Tools => show_tools().await,
        Commands::Init { output } => init_config(output),
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// @ai:intent Run a full comparison, print it and persist the requested outputs
/// @ai:effects fs:read, fs:write, io, network
async fn run_compare(args: CompareArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;
    if let Some(csv) = &args.skip {
        config.extend_skip(csv);
    }
    if let Some(json) = &args.weights {
        config.merge_weights_json(json)?;
    }
    if args.profile.is_some() {
        config.profile_script = args.profile;
    }
    if args.web_app_url.is_some() {
        config.web_app_url = args.web_app_url;
    }

    let status = ToolchainValidator::validate_async().await?;
    ToolchainValidator::log_warnings(&status);

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing with the results collected so far");
            interrupt.cancel();
        }
    });

    let registry = BenchmarkRegistry::builtin(Arc::new(SystemToolRunner::new()));
    let record = Comparison::new(registry)
        .with_cancellation(token)
        .run(&args.codebase1, &args.codebase2, &config)
        .await?;

    print_record(&record, args.verbose);

    ReportGenerator::new().write(&record, args.export.as_deref(), args.report.as_deref())?;

    if !args.no_history {
        let store = HistoryStore::open(&config.history_db).with_context(|| {
            format!("Failed to open history at {}", config.history_db.display())
        })?;
        store.append(&record)?;
    }

    Ok(())
}

/// @ai:intent Print the comparison table, verdict and warnings
/// @ai:effects io
fn print_record(record: &ComparisonRecord, verbose: bool) {
    println!();
    println!("Codebase 1: {}", record.codebase1);
    println!("Codebase 2: {}", record.codebase2);
    println!();
    println!(
        "{:<16} {:>7} {:>14} {:>14} {:>8} {:>8}  {}",
        "Dimension", "Weight", "Raw 1", "Raw 2", "Norm 1", "Norm 2", "Leader"
    );

    for dimension in record.dimensions() {
        let intervals = record
            .confidence_intervals
            .get(&dimension)
            .copied()
            .unwrap_or_default();
        let leader = match record.dimension_winner(dimension) {
            Some(Winner::First) => "1",
            Some(Winner::Second) => "2",
            _ => "=",
        };
        println!(
            "{:<16} {:>7.1} {:>14} {:>14} {:>8.2} {:>8.2}  {}",
            dimension.as_str(),
            record.weights.get(&dimension).copied().unwrap_or(1.0),
            with_interval(record.raw_scores1[&dimension], intervals.codebase1),
            with_interval(record.raw_scores2[&dimension], intervals.codebase2),
            record.normalized_scores1[&dimension],
            record.normalized_scores2[&dimension],
            leader
        );

        if verbose {
            for (label, details) in [("1", &record.details1), ("2", &record.details2)] {
                for line in details.get(&dimension).into_iter().flatten() {
                    println!("    [{}] {}", label, line);
                }
            }
        }
    }

    println!();
    println!(
        "Total: {:.2} vs {:.2}",
        record.total_score1, record.total_score2
    );
    println!("{}", record.summary());

    if !record.skipped.is_empty() {
        println!("Skipped: {}", join_names(&record.skipped));
    }
    if !record.degraded.is_empty() {
        println!(
            "Degraded (scored with reduced evidence): {}",
            join_names(&record.degraded)
        );
    }
    if record.partial {
        println!(
            "Run was interrupted; incomplete: {}",
            join_names(&record.incomplete)
        );
    }
}

fn with_interval(score: f64, interval: Option<codebench::stats::ConfidenceInterval>) -> String {
    match interval {
        Some(ci) if !ci.is_point() => format!("{:.2} ±{:.1}", score, ci.half_width()),
        _ => format!("{:.2}", score),
    }
}

fn join_names(dimensions: &[codebench::Dimension]) -> String {
    dimensions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// @ai:intent List recent runs from the history database
/// @ai:effects fs:read
fn show_history(config: Option<PathBuf>, limit: usize) -> Result<()> {
    let config = load_or_default_config(config)?;
    if !config.history_db.exists() {
        println!("No history at {}", config.history_db.display());
        return Ok(());
    }

    let store = HistoryStore::open(&config.history_db)?;
    let entries = store.recent(limit)?;
    if entries.is_empty() {
        println!("No runs recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "#{:<4} {}  {} ({:.2}) vs {} ({:.2})",
            entry.id, entry.timestamp, entry.codebase1, entry.total1, entry.codebase2, entry.total2
        );
    }
    Ok(())
}

/// @ai:intent Print installed and missing analyzer tools
/// @ai:effects io
async fn show_tools() -> Result<()> {
    let status = ToolchainValidator::validate_async().await?;

    println!("Available tools:");
    for tool in &status.available {
        println!("  [ok] {} ({})", tool.name, tool.used_by);
    }

    if !status.missing.is_empty() {
        println!("Missing tools:");
        for tool in &status.missing {
            println!("  [--] {} ({}): {}", tool.name, tool.used_by, install_hint(tool.name));
        }
        println!(
            "Dimensions that will run degraded: {}",
            join_names(&status.affected_dimensions())
        );
    }
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    CompareConfig::default().save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<CompareConfig> {
    let config = match path {
        Some(p) => CompareConfig::load(&p)
            .with_context(|| format!("Failed to load config from {}", p.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            CompareConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => CompareConfig::default(),
    };
    Ok(config)
}
