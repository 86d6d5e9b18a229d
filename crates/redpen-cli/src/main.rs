//! `redpen` command line.
//!
//! ```text
//! redpen validate guidelines.yaml
//! redpen check --guidelines guidelines.yaml draft.md
//! redpen run --brief "Heat pump adoption" --guidelines guidelines.yaml --dry-run
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr.
//!
//! Exit codes for `run`: 0 accepted, 2 max revisions exceeded, 3 evaluation
//! failed, 4 cancelled, 5 any other abort. `check` exits 2 when a revision
//! is needed. Setup errors exit 1.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redpen_core::{evaluate, verdict_for, GuidelineSet};
use redpen_runtime::{
    AbortReason, ProviderRegistry, ReviewOutput, RuntimeConfig, Tone, WorkflowOrchestrator,
    WorkflowOutcome, WorkflowRequest,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Draft, review, and revise reports against a guideline set.
#[derive(Parser)]
#[command(name = "redpen", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, env = "REDPEN_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a guidelines file against the schema
    Validate {
        /// Guidelines file (YAML or .json)
        guidelines: PathBuf,
    },

    /// Review one draft deterministically and print the reviewer reply
    Check {
        /// Guidelines file (YAML or .json)
        #[arg(short, long)]
        guidelines: PathBuf,

        /// Draft to review
        draft: PathBuf,
    },

    /// Run the full draft/review/revise workflow
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// What the report is about
    #[arg(short, long)]
    brief: String,

    /// Guidelines file (YAML or .json); none means accept on first review
    #[arg(short, long)]
    guidelines: Option<PathBuf>,

    /// Start from this draft instead of researching and drafting
    #[arg(long)]
    draft: Option<PathBuf>,

    /// Runtime config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    max_revisions: Option<u32>,

    /// Accept without reviewing
    #[arg(long)]
    no_guidelines: bool,

    /// Use the offline provider
    #[arg(long)]
    dry_run: bool,

    /// Writing tone, e.g. formal or analytical
    #[arg(long)]
    tone: Option<String>,

    /// Write the final content here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Validate { guidelines } => validate(&guidelines),
        Commands::Check { guidelines, draft } => check(&guidelines, &draft),
        Commands::Run(args) => run(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_guidelines(path: &Path) -> Result<GuidelineSet> {
    GuidelineSet::from_path(path)
        .with_context(|| format!("failed to load guidelines from {}", path.display()))
}

fn validate(path: &Path) -> Result<ExitCode> {
    let guidelines = load_guidelines(path)?;
    println!(
        "{}",
        serde_json::json!({
            "valid": true,
            "version": guidelines.version(),
            "guidelines": guidelines.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(),
        })
    );
    Ok(ExitCode::SUCCESS)
}

fn check(guidelines: &Path, draft: &Path) -> Result<ExitCode> {
    let guidelines = load_guidelines(guidelines)?;
    let content = std::fs::read_to_string(draft)
        .with_context(|| format!("failed to read draft {}", draft.display()))?;

    let result = match evaluate(&content, &guidelines) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(3));
        }
    };

    let output = ReviewOutput::from(&verdict_for(&result));
    println!("{}", serde_json::to_string(&output)?);

    Ok(if output.is_accept() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Config file, then `REDPEN_*` overrides looked up through `env`, then flags.
fn runtime_config<F>(args: &RunArgs, env: F) -> Result<RuntimeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match &args.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    let mut config = config
        .with_env(env)
        .context("invalid REDPEN_* environment override")?;

    if let Some(max) = args.max_revisions {
        config.max_revisions = max;
    }
    if args.no_guidelines {
        config.guidelines_enabled = false;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if let Some(tone) = &args.tone {
        config.tone = Tone::parse_or_default(tone);
        if !config.tone.as_str().eq_ignore_ascii_case(tone.trim()) {
            warn!(requested = %tone, using = %config.tone, "Unknown tone");
        }
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    let config = runtime_config(&args, |key| std::env::var(key).ok())?;

    let guidelines = match &args.guidelines {
        Some(path) => load_guidelines(path)?,
        None => GuidelineSet::empty(),
    };

    let registry = ProviderRegistry::with_defaults();
    let provider = registry
        .create(config.effective_provider(), &config.provider_settings)
        .with_context(|| format!("failed to create provider '{}'", config.effective_provider()))?;

    let mut request = WorkflowRequest::new(args.brief.clone());
    if let Some(path) = &args.draft {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read draft {}", path.display()))?;
        request = request.with_initial_content(content);
    }

    info!(
        provider = config.effective_provider(),
        guidelines = guidelines.len(),
        max_revisions = config.max_revisions,
        "Starting run"
    );

    let orchestrator = WorkflowOrchestrator::builder()
        .config(config)
        .guidelines(Arc::new(guidelines))
        .provider(provider)
        .build()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let outcome = orchestrator.run(request, cancel).await;

    if let Some(path) = &args.output {
        std::fs::write(path, &outcome.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(ExitCode::from(exit_status(&outcome)))
}

fn exit_status(outcome: &WorkflowOutcome) -> u8 {
    match outcome.abort_reason() {
        None => 0,
        Some(AbortReason::MaxRevisionsExceeded { .. }) => 2,
        Some(AbortReason::EvaluationFailed { .. }) => 3,
        Some(AbortReason::Cancelled) => 4,
        Some(AbortReason::MalformedDraft { .. }) | Some(AbortReason::DraftingFailed { .. }) => 5,
    }
}
