//! Structured data: typed tables attached to a sample (resistance-testing
//! results, histology markers and the like).
//!
//! The engine treats table contents as opaque except for header checks done
//! by the validator; only the structured-data patch path replaces them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of table. Determines which headers a row may and must carry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
  /// Antimicrobial resistance (antibiogram) results.
  Amr,
  ChickenData,
  HistologyMarkers,
  MolecularMarkers,
  FattyAcids,
}

impl DataType {
  /// Every header a row of this type may carry, in display order.
  pub fn headers(self) -> &'static [&'static str] {
    match self {
      Self::Amr => &[
        "antibiotic_name",
        "resistance_phenotype",
        "measurement_sign",
        "measurement",
        "measurement_units",
        "laboratory_typing_method",
        "platform",
        "laboratory_typing_platform_version",
        "vendor",
        "ast_standard",
      ],
      Self::ChickenData => &["property", "value", "unit", "partner"],
      Self::HistologyMarkers | Self::MolecularMarkers => {
        &["marker", "measurement", "measurement_units", "partner"]
      }
      Self::FattyAcids => {
        &["fatty_acid", "measurement", "measurement_units", "partner"]
      }
    }
  }

  /// Headers that must be present and non-empty in every row.
  pub fn required_headers(self) -> &'static [&'static str] {
    match self {
      Self::Amr => &[
        "antibiotic_name",
        "resistance_phenotype",
        "measurement",
        "measurement_units",
      ],
      Self::ChickenData => &["property", "value"],
      Self::HistologyMarkers | Self::MolecularMarkers => {
        &["marker", "measurement"]
      }
      Self::FattyAcids => &["fatty_acid", "measurement"],
    }
  }
}

/// A single table cell, optionally annotated with an ontology term.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StructuredCell {
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iri:   Option<String>,
}

impl StructuredCell {
  pub fn new(value: impl Into<String>) -> Self {
    Self { value: value.into(), iri: None }
  }
}

/// One table row, keyed by header.
pub type StructuredRow = BTreeMap<String, StructuredCell>;

/// A typed table of structured data.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct StructuredTable {
  #[serde(rename = "type")]
  pub data_type: DataType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  /// The domain that owns this table, independent of the sample's domain.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub webin_submission_account_id: Option<String>,
  #[serde(default)]
  pub content: Vec<StructuredRow>,
}

impl StructuredTable {
  pub fn new(data_type: DataType) -> Self {
    Self {
      data_type,
      schema: None,
      domain: None,
      webin_submission_account_id: None,
      content: Vec::new(),
    }
  }

  pub fn with_row(mut self, row: StructuredRow) -> Self {
    self.content.push(row);
    self
  }

  /// `(row index, header)` for every required header that is absent or blank.
  pub fn missing_headers(&self) -> Vec<(usize, &'static str)> {
    self
      .content
      .iter()
      .enumerate()
      .flat_map(|(index, row)| {
        self
          .data_type
          .required_headers()
          .iter()
          .filter(move |header| {
            row.get(**header).is_none_or(|cell| cell.value.trim().is_empty())
          })
          .map(move |header| (index, *header))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn amr_row(antibiotic: &str) -> StructuredRow {
    [
      ("antibiotic_name", antibiotic),
      ("resistance_phenotype", "susceptible"),
      ("measurement", "0.25"),
      ("measurement_units", "mg/L"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), StructuredCell::new(v)))
    .collect()
  }

  #[test]
  fn complete_rows_have_no_missing_headers() {
    let table = StructuredTable::new(DataType::Amr)
      .with_row(amr_row("ampicillin"))
      .with_row(amr_row("ciprofloxacin"));
    assert!(table.missing_headers().is_empty());
  }

  #[test]
  fn blank_cells_count_as_missing() {
    let mut row = amr_row("ampicillin");
    row.insert("measurement".into(), StructuredCell::new("  "));
    row.remove("measurement_units");

    let table = StructuredTable::new(DataType::Amr)
      .with_row(amr_row("gentamicin"))
      .with_row(row);

    assert_eq!(table.missing_headers(), vec![
      (1, "measurement"),
      (1, "measurement_units"),
    ]);
  }

  #[test]
  fn data_type_uses_screaming_snake_case_on_the_wire() {
    let json = serde_json::to_string(&DataType::HistologyMarkers).unwrap();
    assert_eq!(json, "\"HISTOLOGY_MARKERS\"");
    assert_eq!(DataType::Amr.to_string(), "AMR");
  }
}
