//! `lectern`: reconciles a local scripture corpus against a remote verse
//! provider.
//!
//! # Usage
//!
//! ```
//! lectern seed canon.toml
//! lectern reconcile
//! lectern reconcile --translation KJV --book Ruth
//! lectern reconcile --translation WEB --translation KJV --audit-only
//! lectern overlay
//! ```
//!
//! Logs go to stderr; the run report is printed to stdout as JSON.

mod seed;
mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use lectern_core::model::normalize_translation;
use lectern_engine::{
  AuditReport, Auditor, EngineConfig, OverlayBuilder, OverlayReport, RateLimiter, Reconciler,
  RunSummary, SourceAdapter,
};
use lectern_source_http::BibleApiClient;
use lectern_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::Settings;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lectern", version, about = "Scripture corpus reconciliation")]
struct Cli {
  /// Path to a TOML settings file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// SQLite store to operate on; overrides `store_path`.
  #[arg(long, value_name = "PATH", env = "LECTERN_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Bring the base translation to completeness and overlay any other
  /// requested translations.
  Reconcile(ReconcileArgs),
  /// Overlay every configured overlay translation.
  Overlay {
    /// Restrict the run to these books.
    #[arg(short, long = "book", value_name = "NAME")]
    books: Vec<String>,
  },
  /// Create missing books and chapters from a canon file.
  Seed {
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },
}

#[derive(Args)]
struct ReconcileArgs {
  /// Translation code to process. Defaults to the base translation.
  #[arg(short, long = "translation", value_name = "CODE")]
  translations: Vec<String>,

  /// Restrict the run to these books.
  #[arg(short, long = "book", value_name = "NAME")]
  books: Vec<String>,

  /// Report completeness without fetching or writing anything.
  #[arg(long)]
  audit_only: bool,
}

// ─── Output ───────────────────────────────────────────────────────────────────

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
  #[serde(skip_serializing_if = "Option::is_none")]
  reconcile: Option<RunSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  overlay:   Option<OverlayReport>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  audits:    Vec<AuditReport>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = match &cli.config {
    Some(path) => Settings::load(path, true)?,
    None => Settings::load(Path::new("lectern.toml"), false)?,
  };
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let store = Arc::new(store);

  let output = match cli.command {
    Command::Seed { file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading canon file {}", file.display()))?;
      let canon = seed::parse(&raw)?;
      let report = seed::seed(store.as_ref(), &canon).await?;
      serde_json::to_string_pretty(&report)?
    }
    Command::Reconcile(args) => {
      let output = reconcile(&settings, store, args).await?;
      serde_json::to_string_pretty(&output)?
    }
    Command::Overlay { books } => {
      let args = ReconcileArgs {
        translations: settings.overlay_translations.clone(),
        books,
        audit_only: false,
      };
      let output = reconcile(&settings, store, args).await?;
      serde_json::to_string_pretty(&output)?
    }
  };

  println!("{output}");
  Ok(())
}

// ─── Runs ─────────────────────────────────────────────────────────────────────

/// Which engines a `reconcile` invocation runs, and for which codes.
#[derive(Debug, Default, PartialEq, Eq)]
struct RunPlan {
  /// Run the Reconciler over the base translation.
  reconcile: bool,
  overlays:  Vec<String>,
  audits:    Vec<String>,
}

/// Route requested translation codes: the base code to the Reconciler,
/// every other code to the Overlay Builder, or everything to the Auditor
/// when `audit_only` is set. No codes means the base translation alone.
fn plan_run(translations: &[String], engine: &EngineConfig, audit_only: bool) -> RunPlan {
  let mut codes: Vec<String> = Vec::new();
  for code in translations.iter().map(|t| normalize_translation(t)) {
    if !code.is_empty() && !codes.contains(&code) {
      codes.push(code);
    }
  }
  if codes.is_empty() {
    codes.push(engine.base_translation.clone());
  }

  if audit_only {
    return RunPlan {
      audits: codes,
      ..RunPlan::default()
    };
  }

  let reconcile = codes.iter().any(|c| engine.is_base(c));
  RunPlan {
    reconcile,
    overlays: codes.into_iter().filter(|c| !engine.is_base(c)).collect(),
    audits: Vec::new(),
  }
}

async fn reconcile(
  settings: &Settings,
  store: Arc<SqliteStore>,
  args: ReconcileArgs,
) -> anyhow::Result<RunOutput> {
  let engine = settings.engine_config()?;
  let plan = plan_run(&args.translations, &engine, args.audit_only);
  let mut output = RunOutput::default();

  if !plan.audits.is_empty() {
    let auditor = Auditor::new(store, engine);
    for code in &plan.audits {
      output.audits.push(auditor.audit(Some(code), &args.books).await?);
    }
    return Ok(output);
  }

  let client = BibleApiClient::new(settings.client_config())
    .context("failed to build verse provider client")?;
  let source = Arc::new(SourceAdapter::new(
    client,
    Arc::new(RateLimiter::new(settings.rate_interval())),
    settings.retry_policy(),
  ));

  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupt received; no further requests will be sent");
        cancel.cancel();
      }
    }
  });

  if plan.reconcile {
    let reconciler = Reconciler::new(Arc::clone(&store), Arc::clone(&source), engine.clone())
      .with_cancellation(cancel.clone());
    output.reconcile = Some(reconciler.run(&args.books).await?);
  }

  if !plan.overlays.is_empty() {
    let builder = OverlayBuilder::new(store, source, engine).with_cancellation(cancel);
    output.overlay = Some(builder.run(&plan.overlays, &args.books).await?);
  }

  Ok(output)
}
