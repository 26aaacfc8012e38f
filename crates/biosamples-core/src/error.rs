//! Error types for `biosamples-core`.

use thiserror::Error;

use crate::accession::Accession;

/// A collaborator error, type-erased at the engine boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One or more rule violations found before anything was written.
///
/// `message` is what callers show to clients; `violations` keeps the
/// individual rule messages for callers that want them separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
  message:    String,
  violations: Vec<String>,
}

impl ValidationError {
  /// A single violated rule.
  pub fn new(message: impl Into<String>) -> Self {
    let message = message.into();
    Self { violations: vec![message.clone()], message }
  }

  /// Several violations, joined into one message with `separator`.
  pub fn joined(violations: Vec<String>, separator: &str) -> Self {
    Self { message: violations.join(separator), violations }
  }

  pub fn message(&self) -> &str { &self.message }

  pub fn violations(&self) -> &[String] { &self.violations }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  /// The accession counter is unavailable. Nothing was written.
  #[error("accession allocation failed: {0}")]
  Allocator(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  /// The record was persisted but the downstream notification failed. The
  /// write is not rolled back.
  #[error("change notification for {accession} failed: {source}")]
  Notification {
    accession: Accession,
    #[source]
    source:    BoxError,
  },

  #[error("sample {0} could not be read back after write")]
  MissingAfterWrite(Accession),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
