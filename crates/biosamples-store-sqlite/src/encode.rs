//! Encoding and decoding helpers between core types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings.
//! Sample documents and attribute or accession lists are compact JSON.

use std::collections::BTreeSet;

use biosamples_core::{
  accession::{Accession, AccessionNamespace},
  curation::CurationLink,
  sample::{Attribute, Relationship, SampleRecord},
  store::ChangeEvent,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_namespace(ns: AccessionNamespace) -> &'static str { ns.into() }

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_document(record: &SampleRecord) -> Result<String> {
  Ok(serde_json::to_string(record)?)
}

pub fn decode_document(s: &str) -> Result<SampleRecord> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_attributes(attributes: &BTreeSet<Attribute>) -> Result<String> {
  Ok(serde_json::to_string(attributes)?)
}

pub fn decode_attributes(s: &str) -> Result<BTreeSet<Attribute>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_accessions(accessions: &[Accession]) -> Result<String> {
  Ok(serde_json::to_string(accessions)?)
}

pub fn decode_accessions(s: &str) -> Result<Vec<Accession>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A relationship edge as stored, without its owner.
pub struct RawRelationship {
  pub source:   String,
  pub rel_type: String,
  pub target:   String,
}

impl RawRelationship {
  pub fn into_relationship(self) -> Relationship {
    Relationship::new(self.source, self.rel_type, self.target)
  }
}

/// Raw strings read directly from a `curation_links` row.
pub struct RawCurationLink {
  pub curation_id:     String,
  pub accession:       String,
  pub domain:          String,
  pub repo:            Option<String>,
  pub attributes_pre:  String,
  pub attributes_post: String,
  pub created:         String,
}

impl RawCurationLink {
  pub fn into_link(self) -> Result<CurationLink> {
    Ok(CurationLink {
      curation_id:     decode_uuid(&self.curation_id)?,
      accession:       Accession::from(self.accession),
      domain:          self.domain,
      repo:            self.repo,
      attributes_pre:  decode_attributes(&self.attributes_pre)?,
      attributes_post: decode_attributes(&self.attributes_post)?,
      created:         decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read directly from a `change_events` row.
pub struct RawChangeEvent {
  pub event_id:      String,
  pub accession:     String,
  pub prior_targets: String,
  pub recorded_at:   String,
}

impl RawChangeEvent {
  pub fn into_event(self) -> Result<ChangeEvent> {
    Ok(ChangeEvent {
      event_id:      decode_uuid(&self.event_id)?,
      accession:     Accession::from(self.accession),
      prior_targets: decode_accessions(&self.prior_targets)?,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}
