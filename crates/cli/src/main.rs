//! tablescout CLI - PRP-driven table discovery
//!
//! This binary provides the command-line interface for the discovery flows.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tablescout::{build_orchestrator, load_config, read_prp, read_target_schema};
use tablescout_discovery::DiscoveryRequest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tablescout")]
#[command(about = "Discover data tables for a Product Requirement Prompt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan keyword queries, search, score and rank candidate tables
    Discover {
        /// PRP markdown file
        prp_file: PathBuf,

        /// Maximum number of tables to return
        #[arg(long)]
        max_results: Option<usize>,

        /// Minimum relevance score (0-100)
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Build a structured search plan for a target schema and run it
    Plan {
        /// PRP markdown file
        prp_file: PathBuf,

        /// Target schema JSON file
        #[arg(long, value_name = "SCHEMA_JSON")]
        schema: PathBuf,

        /// Print the plan without executing it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Discover {
            prp_file,
            max_results,
            min_score,
        } => discover(cli.config.as_deref(), &prp_file, max_results, min_score).await,
        Commands::Plan {
            prp_file,
            schema,
            dry_run,
        } => plan(cli.config.as_deref(), &prp_file, &schema, dry_run).await,
    }
}

/// Initialize logging system. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tablescout={level},tablescout_core={level},tablescout_search_client={level},tablescout_discovery={level}"
        ))
    });

    // stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn discover(
    config_path: Option<&Path>,
    prp_file: &Path,
    max_results: Option<usize>,
    min_score: Option<f64>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;

    let request = DiscoveryRequest {
        max_results,
        min_relevance_score: min_score,
        ..DiscoveryRequest::new(read_prp(prp_file)?)
    };

    let response = orchestrator
        .discover(request)
        .await
        .context("Discovery failed")?;
    info!(
        "Found {} tables in {}ms",
        response.total_count, response.discovery_metadata.total_time_ms
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn plan(
    config_path: Option<&Path>,
    prp_file: &Path,
    schema_file: &Path,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config)?;
    let prp = read_prp(prp_file)?;
    let target_schema = read_target_schema(schema_file)?;

    let search_plan = orchestrator
        .create_plan(&prp, &target_schema)
        .await
        .context("Failed to create search plan")?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&search_plan)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing the current step");
                cancel.cancel();
            }
        })
    };

    let results = orchestrator.execute_plan(&search_plan, &cancel).await;
    ctrl_c.abort();

    if cancel.is_cancelled() {
        warn!(
            "Returning {} of {} steps",
            results.len(),
            search_plan.steps.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
