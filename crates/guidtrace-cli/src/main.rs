//! `guidtrace`: reconcile an interface record table against an XML corpus.
//!
//! # Usage
//!
//! ```
//! guidtrace run --input records.csv --corpus ./icd --output annotated.csv
//! guidtrace run --reset --config ~/.config/guidtrace/guidtrace.toml
//! guidtrace verify --db trace.db
//! guidtrace reset --db trace.db
//! ```

mod settings;
mod table_io;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use guidtrace_core::store::TraceStore;
use guidtrace_engine::{Reconciler, RunReport, verify};
use guidtrace_store_sqlite::SqliteStore;
use settings::{Settings, expand_tilde};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Trace interface GUIDs through an XML corpus")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "guidtrace.toml", global = true)]
  config: PathBuf,

  /// SQLite database path (overrides `store_path`).
  #[arg(long, value_name = "FILE", global = true)]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Index the table, scan the corpus, persist matches and write the
  /// annotated table.
  Run(RunArgs),
  /// Clear every table in the store.
  Reset,
  /// Check that a stored document can be found by path and by name.
  Verify,
}

#[derive(Args, Debug)]
struct RunArgs {
  /// Clear the store before scanning.
  #[arg(long)]
  reset: bool,

  /// Input CSV table (overrides `input_path`).
  #[arg(short, long, value_name = "FILE")]
  input: Option<PathBuf>,

  /// Corpus root directory (overrides `corpus_root`).
  #[arg(long, value_name = "DIR")]
  corpus: Option<PathBuf>,

  /// Annotated output CSV (overrides `output_path`).
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Documents parsed at once (overrides `scan.concurrency`).
  #[arg(long)]
  concurrency: Option<usize>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&expand_tilde(&cli.config))
    .with_context(|| format!("failed to read config {}", cli.config.display()))?;
  if let Some(db) = cli.db {
    settings.store_path = db;
  }

  match cli.command {
    Command::Run(args) => run(settings, args).await,
    Command::Reset => reset(settings.expand_paths()).await,
    Command::Verify => verify_store(settings.expand_paths()).await,
  }
}

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn run(mut settings: Settings, args: RunArgs) -> anyhow::Result<()> {
  if let Some(input) = args.input {
    settings.input_path = input;
  }
  if let Some(corpus) = args.corpus {
    settings.corpus_root = corpus;
  }
  if let Some(output) = args.output {
    settings.output_path = output;
  }
  if let Some(concurrency) = args.concurrency {
    settings.scan.concurrency = concurrency;
  }
  let settings = settings.expand_paths();

  let store = open_store(&settings).await?;
  let table = table_io::read_table(&settings.input_path)?;

  let reconciliation = Reconciler::new(&store)
    .columns(settings.columns.clone())
    .result_columns(settings.result_columns.clone())
    .keywords(settings.keyword_rules())
    .options(settings.scan.clone())
    .reset_store(args.reset)
    .run(table, &settings.corpus_root)
    .await
    .context("reconciliation failed")?;

  log_report(&reconciliation.report);
  table_io::write_table(&settings.output_path, reconciliation.table.table())?;
  info!(path = %settings.output_path.display(), "annotated table written");

  verify(&store).await.context("store verification failed")?;
  Ok(())
}

async fn reset(settings: Settings) -> anyhow::Result<()> {
  let store = open_store(&settings).await?;
  store.reset().await.context("failed to reset store")?;
  info!(path = %settings.store_path.display(), "store reset");
  Ok(())
}

async fn verify_store(settings: Settings) -> anyhow::Result<()> {
  let store = open_store(&settings).await?;
  let counts = store.counts().await.context("failed to count store rows")?;
  info!(
    documents = counts.documents,
    matches = counts.matches,
    records = counts.records,
    "store contents"
  );

  match verify(&store).await.context("store verification failed")? {
    Some(check) if !check.is_consistent() => {
      bail!("document {} is not retrievable both ways", check.path.display())
    }
    Some(_) => Ok(()),
    None => {
      info!("store holds no documents");
      Ok(())
    }
  }
}

fn log_report(report: &RunReport) {
  info!(
    indexed_guids = report.indexed_guids,
    files = report.files_enumerated,
    parsed = report.files_parsed,
    parse_failures = report.parse_failures,
    with_matches = report.files_with_matches,
    commit_failures = report.commit_failures,
    match_triples = report.match_triples,
    matched_guids = report.matched_guids,
    rows_annotated = report.rows_annotated,
    "run report"
  );
}
