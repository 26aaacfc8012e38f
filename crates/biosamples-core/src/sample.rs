//! Sample records, the unit of storage in the registry.
//!
//! Records are treated as immutable values: every transformation the engine
//! applies goes through a `with_*` constructor that consumes one value and
//! returns another, so an old version is never edited in place.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{accession::Accession, structured::StructuredTable};

// ─── Attributes ──────────────────────────────────────────────────────────────

/// A key/value characteristic, optionally tagged with an ontology term.
///
/// Keys are not unique: the same key may appear with different values.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Attribute {
  #[serde(rename = "type")]
  pub key:   String,
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iri:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unit:  Option<String>,
}

impl Attribute {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self { key: key.into(), value: value.into(), iri: None, unit: None }
  }

  pub fn with_iri(mut self, iri: impl Into<String>) -> Self {
    self.iri = Some(iri.into());
    self
  }
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// A typed, directed edge between two records, e.g. `derived from`.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Relationship {
  pub source:   Accession,
  #[serde(rename = "type")]
  pub rel_type: String,
  pub target:   Accession,
}

impl Relationship {
  pub fn new(
    source: impl Into<Accession>,
    rel_type: impl Into<String>,
    target: impl Into<Accession>,
  ) -> Self {
    Self {
      source:   source.into(),
      rel_type: rel_type.into(),
      target:   target.into(),
    }
  }
}

/// A link to the same sample in an external archive.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ExternalReference {
  pub url: String,
  /// Data-use-ontology codes restricting reuse of the referenced data.
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub duo: BTreeSet<String>,
}

// ─── People and papers ───────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doi:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pubmed_id: Option<String>,
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
pub struct Organization {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url:   Option<String>,
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub affiliation: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role:        Option<String>,
}

// ─── SampleRecord ────────────────────────────────────────────────────────────

/// A versioned sample (or group) record.
///
/// `accession` is `None` until the record is first stored; after that it is
/// fixed for the life of the record. Each timestamp is independently optional:
/// `None` means "not known", never a sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub accession: Option<Accession>,
  #[serde(default)]
  pub name: String,
  /// The owning domain; certain reserved values mark import pipelines.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tax_id: Option<u64>,

  #[serde(default)]
  pub attributes: BTreeSet<Attribute>,
  #[serde(default)]
  pub relationships: BTreeSet<Relationship>,
  #[serde(default)]
  pub external_references: BTreeSet<ExternalReference>,
  #[serde(default, rename = "data")]
  pub structured_data: BTreeSet<StructuredTable>,
  #[serde(default)]
  pub publications: BTreeSet<Publication>,
  #[serde(default)]
  pub organizations: BTreeSet<Organization>,
  #[serde(default)]
  pub contacts: BTreeSet<Contact>,

  /// When the record first existed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub create:    Option<DateTime<Utc>>,
  /// When substantive metadata was first submitted.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub submitted: Option<DateTime<Utc>>,
  /// Last modification.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub update:    Option<DateTime<Utc>>,
  /// Public release date.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release:   Option<DateTime<Utc>>,
}

impl SampleRecord {
  /// A bare record with only a name.
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn has_accession(&self) -> bool { self.accession.is_some() }

  pub fn with_accession(self, accession: Accession) -> Self {
    Self { accession: Some(accession), ..self }
  }

  pub fn with_domain(self, domain: impl Into<String>) -> Self {
    Self { domain: Some(domain.into()), ..self }
  }

  pub fn with_create(self, create: Option<DateTime<Utc>>) -> Self {
    Self { create, ..self }
  }

  pub fn with_submitted(self, submitted: Option<DateTime<Utc>>) -> Self {
    Self { submitted, ..self }
  }

  pub fn with_update(self, update: Option<DateTime<Utc>>) -> Self {
    Self { update, ..self }
  }

  pub fn with_release(self, release: Option<DateTime<Utc>>) -> Self {
    Self { release, ..self }
  }

  pub fn with_attribute(mut self, attribute: Attribute) -> Self {
    self.attributes.insert(attribute);
    self
  }

  pub fn with_relationship(mut self, relationship: Relationship) -> Self {
    self.relationships.insert(relationship);
    self
  }

  pub fn with_structured_data(
    self,
    structured_data: BTreeSet<StructuredTable>,
  ) -> Self {
    Self { structured_data, ..self }
  }

  /// Targets of relationships that originate at `accession`.
  ///
  /// Used on update to tell downstream consumers which edges may have been
  /// removed by the new version.
  pub fn relationship_targets_from(&self, accession: &Accession) -> Vec<Accession> {
    self
      .relationships
      .iter()
      .filter(|rel| &rel.source == accession)
      .map(|rel| rel.target.clone())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relationship_targets_only_include_outgoing_edges() {
    let accession = Accession::from("SAMEA1");
    let record = SampleRecord::new("liver biopsy")
      .with_accession(accession.clone())
      .with_relationship(Relationship::new("SAMEA1", "derived from", "SAMEA7"))
      .with_relationship(Relationship::new("SAMEA1", "same as", "SAMEA9"))
      .with_relationship(Relationship::new("SAMEA3", "child of", "SAMEA1"));

    let targets = record.relationship_targets_from(&accession);
    assert_eq!(targets, vec![Accession::from("SAMEA7"), Accession::from("SAMEA9")]);
  }

  #[test]
  fn minimal_json_payload_deserialises_with_empty_sets() {
    let record: SampleRecord =
      serde_json::from_str(r#"{"name":"blood draw","taxId":9606}"#).unwrap();

    assert_eq!(record.name, "blood draw");
    assert_eq!(record.tax_id, Some(9606));
    assert!(record.accession.is_none());
    assert!(record.attributes.is_empty());
    assert!(record.structured_data.is_empty());
    assert!(record.create.is_none());
  }

  #[test]
  fn with_constructors_leave_other_fields_alone() {
    let base = SampleRecord::new("soil core")
      .with_attribute(Attribute::new("depth", "30cm"))
      .with_domain("self.example");
    let stamped = base.clone().with_submitted(None).with_update(Some(Utc::now()));

    assert_eq!(stamped.name, base.name);
    assert_eq!(stamped.attributes, base.attributes);
    assert_eq!(stamped.domain, base.domain);
    assert!(stamped.update.is_some());
  }
}
