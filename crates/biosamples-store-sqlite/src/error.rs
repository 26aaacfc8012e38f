//! Error type for `biosamples-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// `save` was handed a record that was never allocated an accession.
  #[error("cannot save sample {0:?} without an accession")]
  MissingAccession(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
