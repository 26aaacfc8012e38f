//! `biosamples`: command-line front end to the sample write engine.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one sub-command against it. Records are read and printed as
//! JSON.
//!
//! ```
//! biosamples store sample.json
//! biosamples fetch SAMEA123 --curation-domain self.zooma
//! BIOSAMPLES_INGEST_CONCURRENCY=32 biosamples ingest-amr amr.tsv
//! ```

mod ingest;
mod settings;

use std::{
  io::Read as _,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use biosamples_core::{
  accession::Accession,
  curation::{NewCurationLink, ReadView},
  domain::Authority,
  sample::SampleRecord,
  service::SampleService,
};
use biosamples_store_sqlite::SqliteStore;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use settings::CliConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "biosamples", version, about = "BioSamples record store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Store a sample, allocating an accession if it has none.
  Store {
    /// JSON file holding the sample, or `-` for stdin.
    input:     PathBuf,
    /// Allocate from the group namespace.
    #[arg(long)]
    group:     bool,
    /// Credential system of the submitter (`WEBIN` or `AAP`).
    #[arg(long, default_value = "AAP")]
    authority: Authority,
  },

  /// Replace the structured data of an existing sample.
  Patch {
    input:     PathBuf,
    #[arg(long, default_value = "AAP")]
    authority: Authority,
  },

  /// Print a sample as served on the read path.
  Fetch {
    accession:        String,
    /// Only apply curations from these domains (repeatable).
    #[arg(long = "curation-domain")]
    curation_domains: Vec<String>,
    /// Only apply curations recorded by this repository.
    #[arg(long)]
    curation_repo:    Option<String>,
    /// Print the record as stored, without curations.
    #[arg(long, conflicts_with_all = ["curation_domains", "curation_repo"])]
    raw:              bool,
  },

  /// Check whether a sample with this domain and name exists.
  Exists { domain: String, name: String },

  /// Validate a JSON sample without storing it.
  Validate { input: PathBuf },

  /// Record a curation link read from a JSON file.
  Curate { input: PathBuf },

  /// Print the change-event outbox.
  Events,

  /// Attach AMR results from a tab-separated export.
  IngestAmr {
    input:       PathBuf,
    /// Overrides `ingest_concurrency` from the config.
    #[arg(long)]
    concurrency: Option<usize>,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  let store_path = cfg.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let service = SampleService::new(store.clone(), store.clone());

  match cli.command {
    Command::Store { input, group, authority } => {
      let document = read_json(&input)?;
      service.validate_document(&document)?;
      let record: SampleRecord =
        serde_json::from_value(document).context("failed to decode sample")?;
      let record = record.with_update(Some(Utc::now()));

      let first = service.before_store(&record).await?;
      let stored = service.store(record, group, first, authority).await?;
      print_json(&stored)?;
    }

    Command::Patch { input, authority } => {
      let payload: SampleRecord = serde_json::from_value(read_json(&input)?)
        .context("failed to decode patch")?;
      let stored = service.store_patch(payload, authority).await?;
      print_json(&stored)?;
    }

    Command::Fetch { accession, curation_domains, curation_repo, raw } => {
      let view = if raw {
        ReadView::raw()
      } else {
        ReadView {
          curation_domains: (!curation_domains.is_empty()).then_some(curation_domains),
          curation_repo,
        }
      };
      let accession = Accession::from(accession);
      let record = service
        .fetch(&accession, &view)
        .await?
        .with_context(|| format!("sample {accession} not found"))?;
      print_json(&record)?;
    }

    Command::Exists { domain, name } => {
      let exists = service.exists_by_domain_and_name(&domain, &name).await?;
      println!("{exists}");
    }

    Command::Validate { input } => {
      service.validate_document(&read_json(&input)?)?;
      println!("valid");
    }

    Command::Curate { input } => {
      let link: NewCurationLink = serde_json::from_value(read_json(&input)?)
        .context("failed to decode curation link")?;
      let accession = link.accession.clone();
      if service.is_not_existing_accession(&accession).await? {
        anyhow::bail!("sample {accession} not found");
      }
      print_json(&store.record_curation(link).await?)?;
    }

    Command::Events => {
      print_json(&store.change_events().await?)?;
    }

    Command::IngestAmr { input, concurrency } => {
      let export = read_input(&input)?;
      let batch = ingest::parse_amr_tsv(&export)
        .with_context(|| format!("failed to parse {input:?}"))?;
      let concurrency = concurrency.unwrap_or(cfg.ingest_concurrency);
      tracing::info!(samples = batch.tables.len(), concurrency, "starting AMR ingestion");

      let report = ingest::ingest(Arc::new(service), batch, concurrency).await;
      print_json(&report)?;
    }
  }

  Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Read `path`, or stdin when `path` is `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
  if path == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("failed to read stdin")?;
    return Ok(buf);
  }
  std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
  serde_json::from_str(&read_input(path)?)
    .with_context(|| format!("{path:?} is not valid JSON"))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
