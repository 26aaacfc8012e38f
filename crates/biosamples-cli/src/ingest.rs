//! Bulk ingestion of antimicrobial-resistance (AMR) results.
//!
//! The input is a tab-separated export whose first column is the sample
//! accession and whose remaining columns are AMR headers. Rows are grouped
//! into one AMR table per accession, and a bounded pool of workers submits
//! each table through the structured-data patch path.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use biosamples_core::{
  accession::{Accession, AccessionNamespace},
  curation::ReadView,
  domain::{Authority, ENA_IMPORT_DOMAIN},
  sample::SampleRecord,
  service::SampleService,
  structured::{DataType, StructuredCell, StructuredRow, StructuredTable},
};
use biosamples_store_sqlite::SqliteStore;
use serde::Serialize;
use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinSet};

pub const AMR_SCHEMA: &str = "https://www.ebi.ac.uk/biosamples/schemas/amr.json";

const TAB: char = '\t';

pub type Service = SampleService<SqliteStore, SqliteStore>;

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmrParseError {
  #[error("AMR export is empty")]
  Empty,

  #[error("first column must be `accession`, found {0:?}")]
  MissingAccessionColumn(String),

  #[error("unknown AMR column {0:?}")]
  UnknownColumn(String),
}

/// A parsed export: one table per accession, plus the accessions that had at
/// least one row that could not be parsed.
#[derive(Debug, Default)]
pub struct AmrBatch {
  pub tables:    BTreeMap<Accession, StructuredTable>,
  pub malformed: BTreeSet<Accession>,
}

fn normalise_header(header: &str) -> String {
  header.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Parse a tab-separated AMR export.
///
/// Trailing tabs are ignored and empty cells are left out of the row. A row
/// with more cells than there are columns is malformed: it is dropped and its
/// accession is reported, while the accession's other rows are kept.
pub fn parse_amr_tsv(input: &str) -> Result<AmrBatch, AmrParseError> {
  let mut lines = input.lines().filter(|line| !line.trim().is_empty());

  let header_line = lines.next().ok_or(AmrParseError::Empty)?;
  let mut headers = header_line.trim_end_matches(TAB).split(TAB).map(normalise_header);

  match headers.next() {
    Some(first) if first == "accession" => {}
    other => {
      return Err(AmrParseError::MissingAccessionColumn(other.unwrap_or_default()));
    }
  }

  let columns: Vec<String> = headers.collect();
  if let Some(unknown) = columns
    .iter()
    .find(|column| !DataType::Amr.headers().contains(&column.as_str()))
  {
    return Err(AmrParseError::UnknownColumn(unknown.clone()));
  }

  let mut batch = AmrBatch::default();
  for line in lines {
    let mut cells = line.trim_end_matches(TAB).split(TAB);
    let Some(accession) = cells.next().map(str::trim).filter(|a| !a.is_empty())
    else {
      tracing::warn!(line, "skipping AMR row without an accession");
      continue;
    };
    let accession = Accession::from(accession);

    let values: Vec<&str> = cells.collect();
    if values.len() > columns.len() {
      tracing::error!(%accession, "error parsing AMR row");
      batch.malformed.insert(accession);
      continue;
    }

    let row: StructuredRow = columns
      .iter()
      .zip(values)
      .filter(|(_, value)| !value.trim().is_empty())
      .map(|(column, value)| (column.clone(), StructuredCell::new(value.trim())))
      .collect();

    batch
      .tables
      .entry(accession)
      .or_insert_with(amr_table)
      .content
      .push(row);
  }

  Ok(batch)
}

fn amr_table() -> StructuredTable {
  StructuredTable {
    schema: Some(AMR_SCHEMA.to_owned()),
    domain: Some(ENA_IMPORT_DOMAIN.to_owned()),
    ..StructuredTable::new(DataType::Amr)
  }
}

// ─── Worker pool ─────────────────────────────────────────────────────────────

/// The result of one ingestion run.
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
  pub submitted: Vec<Accession>,
  /// Non-ENA samples that already carry structured data.
  pub skipped:   Vec<Accession>,
  /// Accessions with no stored sample.
  pub missing:   Vec<Accession>,
  /// Malformed rows or failed submissions.
  pub failed:    Vec<Accession>,
}

enum Outcome {
  Submitted,
  Skipped,
  Missing,
  Failed,
}

/// Submit every table in `batch`, at most `concurrency` at a time.
pub async fn ingest(
  service: Arc<Service>,
  batch: AmrBatch,
  concurrency: usize,
) -> IngestReport {
  let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
  let mut join_set: JoinSet<(Accession, Outcome)> = JoinSet::new();

  for (accession, table) in batch.tables {
    if table.content.is_empty() {
      continue;
    }
    let service = service.clone();
    let sem = semaphore.clone();
    join_set.spawn(async move {
      let Ok(_permit) = sem.acquire().await else {
        return (accession, Outcome::Failed);
      };
      let outcome = submit(&service, &accession, table).await;
      (accession, outcome)
    });
  }

  let mut report = IngestReport {
    failed: batch.malformed.into_iter().collect(),
    ..IngestReport::default()
  };

  while let Some(joined) = join_set.join_next().await {
    let (accession, outcome) = match joined {
      Ok(result) => result,
      Err(e) => {
        tracing::error!(error = %e, "ingestion worker panicked");
        continue;
      }
    };
    let bucket = match outcome {
      Outcome::Submitted => &mut report.submitted,
      Outcome::Skipped => &mut report.skipped,
      Outcome::Missing => &mut report.missing,
      Outcome::Failed => &mut report.failed,
    };
    bucket.push(accession);
  }

  for bucket in [
    &mut report.submitted,
    &mut report.skipped,
    &mut report.missing,
    &mut report.failed,
  ] {
    bucket.sort();
    bucket.dedup();
  }
  report
}

async fn submit(
  service: &Service,
  accession: &Accession,
  table: StructuredTable,
) -> Outcome {
  let sample = match service.fetch(accession, &ReadView::raw()).await {
    Ok(Some(sample)) => sample,
    Ok(None) => {
      tracing::info!(%accession, "sample doesn't exist");
      return Outcome::Missing;
    }
    Err(e) => {
      tracing::error!(%accession, error = %e, "failed to fetch sample");
      return Outcome::Failed;
    }
  };

  let is_ena = accession.namespace() == Some(AccessionNamespace::Sample);
  if !is_ena && !sample.structured_data.is_empty() {
    tracing::info!(
      %accession,
      "not an ENA sample and AMR data already present, skipping"
    );
    return Outcome::Skipped;
  }

  let payload = SampleRecord::new(sample.name)
    .with_accession(accession.clone())
    .with_structured_data([table].into());

  match service.store_patch(payload, Authority::Other).await {
    Ok(_) => {
      tracing::info!(%accession, "submitted sample with structured data");
      Outcome::Submitted
    }
    Err(e) => {
      tracing::error!(%accession, error = %e, "failed to submit AMR data");
      Outcome::Failed
    }
  }
}
