//! The structured-data patch path.
//!
//! A patch replaces only a record's structured-data collection. Callers send
//! a record-shaped payload; [`StructuredDataPatch::from_payload`] checks its
//! shape and keeps only the parts a patch may carry, so a constructed patch
//! cannot smuggle in attributes, relationships or a domain.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{
  accession::Accession,
  error::ValidationError,
  sample::SampleRecord,
  structured::StructuredTable,
};

pub const NO_STRUCTURED_DATA: &str = "No structured data is provided";
pub const ONLY_STRUCTURED_DATA: &str = "Only Sample name, sample accession and \
                                        sample structured data can be provided \
                                        through this API";
pub const MISSING_ACCESSION: &str = "Sample doesn't have an accession";

/// A validated structured-data-only update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDataPatch {
  accession:       Accession,
  name:            String,
  structured_data: BTreeSet<StructuredTable>,
}

impl StructuredDataPatch {
  /// Check the payload's shape. Rules are checked in order and the first
  /// violation is reported.
  pub fn from_payload(payload: SampleRecord) -> Result<Self, ValidationError> {
    if payload.structured_data.is_empty() {
      return Err(ValidationError::new(NO_STRUCTURED_DATA));
    }

    let carries_other_fields = !payload.attributes.is_empty()
      || !payload.external_references.is_empty()
      || !payload.relationships.is_empty()
      || !payload.contacts.is_empty()
      || !payload.publications.is_empty()
      || payload.domain.as_deref().is_some_and(|d| !d.is_empty());
    if carries_other_fields {
      return Err(ValidationError::new(ONLY_STRUCTURED_DATA));
    }

    let Some(accession) = payload.accession else {
      return Err(ValidationError::new(MISSING_ACCESSION));
    };

    Ok(Self {
      accession,
      name: payload.name,
      structured_data: payload.structured_data,
    })
  }

  pub fn accession(&self) -> &Accession { &self.accession }

  pub fn structured_data(&self) -> &BTreeSet<StructuredTable> {
    &self.structured_data
  }

  /// Build the record to persist.
  ///
  /// With a stored version, that version is kept except for its structured
  /// data and `update`. Without one, the patch itself becomes the record.
  pub fn apply(
    self,
    existing: Option<&SampleRecord>,
    now: DateTime<Utc>,
  ) -> SampleRecord {
    let base = match existing {
      Some(existing) => existing.clone(),
      None => SampleRecord::new(self.name).with_accession(self.accession),
    };
    base
      .with_structured_data(self.structured_data)
      .with_update(Some(now))
  }
}
