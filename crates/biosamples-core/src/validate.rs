//! Record validation.
//!
//! The engine only needs the list of violation messages; an empty list means
//! the record is valid. [`SchemaValidator`] is the built-in rule set.

use crate::sample::SampleRecord;

pub trait SampleValidator: Send + Sync {
  /// Violations for a typed record.
  fn validate(&self, record: &SampleRecord) -> Vec<String>;

  /// Violations for an untyped JSON payload, before it is deserialised.
  fn validate_document(&self, document: &serde_json::Value) -> Vec<String>;
}

/// Structural rules every stored record must satisfy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SampleValidator for SchemaValidator {
  fn validate(&self, record: &SampleRecord) -> Vec<String> {
    let mut errors = Vec::new();

    if record.name.trim().is_empty() {
      errors.push("Sample name must be provided".to_owned());
    }

    for attribute in &record.attributes {
      if attribute.key.trim().is_empty() {
        errors.push(format!(
          "Attribute with value {:?} has an empty type",
          attribute.value
        ));
      }
      if attribute.value.trim().is_empty() {
        errors.push(format!("Attribute {:?} has an empty value", attribute.key));
      }
    }

    for rel in &record.relationships {
      if rel.rel_type.trim().is_empty() {
        errors.push(format!(
          "Relationship {} -> {} has an empty type",
          rel.source, rel.target
        ));
      }
      if rel.source.as_str().is_empty() || rel.target.as_str().is_empty() {
        errors.push(format!(
          "Relationship {:?} must have both a source and a target",
          rel.rel_type
        ));
      }
    }

    for reference in &record.external_references {
      if reference.url.trim().is_empty() {
        errors.push("External reference must have a url".to_owned());
      }
    }

    for table in &record.structured_data {
      for (row, header) in table.missing_headers() {
        errors.push(format!(
          "{} row {row} is missing required field {header:?}",
          table.data_type
        ));
      }
    }

    errors
  }

  fn validate_document(&self, document: &serde_json::Value) -> Vec<String> {
    if !document.is_object() {
      return vec!["Sample must be a JSON object".to_owned()];
    }
    match serde_json::from_value::<SampleRecord>(document.clone()) {
      Ok(record) => self.validate(&record),
      Err(e) => vec![format!("Malformed sample: {e}")],
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{
    sample::{Attribute, Relationship},
    structured::{DataType, StructuredCell, StructuredTable},
  };

  #[test]
  fn named_record_is_valid() {
    assert!(SchemaValidator.validate(&SampleRecord::new("ok")).is_empty());
  }

  #[test]
  fn collects_every_violation() {
    let table = StructuredTable::new(DataType::Amr).with_row(
      [("antibiotic_name".to_owned(), StructuredCell::new("ampicillin"))].into(),
    );
    let record = SampleRecord::new(" ")
      .with_attribute(Attribute::new("tissue", ""))
      .with_relationship(Relationship::new("SAMEA1", "", "SAMEA2"))
      .with_structured_data([table].into());

    let errors = SchemaValidator.validate(&record);
    assert_eq!(errors.len(), 6, "{errors:#?}");
    assert_eq!(errors[0], "Sample name must be provided");
    assert!(errors.iter().any(|e| e.contains("\"measurement_units\"")));
  }

  #[test]
  fn untyped_documents() {
    assert_eq!(
      SchemaValidator.validate_document(&json!(["not", "an", "object"])),
      vec!["Sample must be a JSON object".to_owned()]
    );
    assert!(
      SchemaValidator.validate_document(&json!({ "name": "x", "taxId": "nine" }))[0]
        .starts_with("Malformed sample")
    );
    assert!(SchemaValidator.validate_document(&json!({ "name": "x" })).is_empty());
    assert_eq!(SchemaValidator.validate_document(&json!({})).len(), 1);
  }
}
