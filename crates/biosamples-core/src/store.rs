//! Collaborator traits consumed by the write engine.
//!
//! Implemented by storage backends (e.g. `biosamples-store-sqlite`). The
//! engine in [`crate::service`] depends only on these abstractions.
//!
//! All methods return `Send` futures so implementations can be shared across
//! tasks in a multi-threaded tokio runtime.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  accession::{Accession, AccessionNamespace},
  curation::ReadView,
  sample::SampleRecord,
};

// ─── Persistence ─────────────────────────────────────────────────────────────

/// The persistence gateway for sample records.
///
/// There is no compare-and-swap: two concurrent `save`s of the same accession
/// race and the last one wins.
pub trait SampleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The record exactly as last saved. Returns `None` if not found.
  fn load(
    &self,
    accession: Accession,
  ) -> impl Future<Output = Result<Option<SampleRecord>, Self::Error>> + Send + '_;

  /// Persist `record`, replacing any previous version. The record must carry
  /// an accession.
  fn save(
    &self,
    record: SampleRecord,
  ) -> impl Future<Output = Result<SampleRecord, Self::Error>> + Send + '_;

  fn exists(
    &self,
    accession: Accession,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn exists_by_domain_and_name<'a>(
    &'a self,
    domain: &'a str,
    name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The read path: the stored record with curations selected by `view` and
  /// inverse relationships overlaid. Returns `None` if not found.
  fn fetch<'a>(
    &'a self,
    accession: Accession,
    view: &'a ReadView,
  ) -> impl Future<Output = Result<Option<SampleRecord>, Self::Error>> + Send + 'a;
}

// ─── Accession counter ───────────────────────────────────────────────────────

/// A durable, atomically incremented counter per accession namespace.
pub trait AccessionCounter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the next value for `namespace`. No value may ever be returned
  /// twice for the same namespace, whatever the number of concurrent callers.
  fn increment(
    &self,
    namespace: AccessionNamespace,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Change notification ─────────────────────────────────────────────────────

/// A change notification as delivered downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
  pub event_id:      Uuid,
  pub accession:     Accession,
  /// Relationship targets of the previous version, so consumers can detect
  /// removed edges. Empty for new records.
  pub prior_targets: Vec<Accession>,
  pub recorded_at:   DateTime<Utc>,
}

/// Tells downstream consumers (indexers, exporters) that a record changed.
///
/// Delivery guarantees belong to the implementation; the engine does not
/// retry.
pub trait ChangeNotifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    accession: Accession,
    prior_targets: Vec<Accession>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
