//! Reconciling an incoming record with the stored version.

use crate::{
  domain::WriteContext,
  provenance,
  sample::SampleRecord,
};

/// Produce the record to persist when `incoming` rewrites `existing`.
///
/// The result equals `incoming` in every field except `create` and
/// `submitted`, which come from [`provenance::resolve`]. `update` is taken as
/// given: callers stamp it with the write time before merging.
pub fn merge(
  incoming: &SampleRecord,
  existing: &SampleRecord,
  first_metadata_added: bool,
  context: &WriteContext,
) -> SampleRecord {
  if incoming == existing {
    tracing::info!(
      accession = ?existing.accession,
      "incoming sample is identical to the stored version"
    );
  }

  let provenance =
    provenance::resolve(incoming, existing, first_metadata_added, context);

  incoming
    .clone()
    .with_create(provenance.create)
    .with_submitted(provenance.submitted)
}
