//! Who is writing: domain classification and authority context.
//!
//! Both are resolved once, when a write enters the engine, and carried as
//! typed values through provenance derivation.

use serde::{Deserialize, Serialize};

use crate::sample::SampleRecord;

/// Domain used by the ENA import pipeline.
pub const ENA_IMPORT_DOMAIN: &str = "self.BiosampleImportENA";
/// Domain used by the NCBI import pipeline.
pub const NCBI_IMPORT_DOMAIN: &str = "self.BiosampleImportNCBI";

/// The class of actor that owns a record, derived from its domain string.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DomainClassification {
  /// Any non-pipeline domain, including an absent one.
  #[default]
  Interactive,
  EnaPipeline,
  NcbiPipeline,
}

impl DomainClassification {
  /// Classify a raw domain. Matching is ASCII case-insensitive.
  pub fn classify(domain: Option<&str>) -> Self {
    match domain {
      Some(d) if d.eq_ignore_ascii_case(ENA_IMPORT_DOMAIN) => Self::EnaPipeline,
      Some(d) if d.eq_ignore_ascii_case(NCBI_IMPORT_DOMAIN) => {
        Self::NcbiPipeline
      }
      _ => Self::Interactive,
    }
  }

  /// Bulk-imported data; never counts as a first submission.
  pub fn is_pipeline(self) -> bool {
    matches!(self, Self::EnaPipeline | Self::NcbiPipeline)
  }
}

/// The credential system that authorised a write.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Authority {
  #[strum(serialize = "WEBIN")]
  Webin,
  /// AAP, interactive and pipeline tokens.
  #[default]
  #[strum(serialize = "AAP")]
  Other,
}

impl Authority {
  /// Parse a provider identifier. Anything other than `WEBIN` (in any case)
  /// is [`Authority::Other`].
  pub fn from_provider(provider: Option<&str>) -> Self {
    provider.and_then(|p| p.parse().ok()).unwrap_or_default()
  }

  pub fn is_webin(self) -> bool { matches!(self, Self::Webin) }
}

/// Typed context for one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteContext {
  pub authority: Authority,
  pub domain:    DomainClassification,
}

impl WriteContext {
  /// Classify `incoming`'s domain under `authority`.
  pub fn for_record(incoming: &SampleRecord, authority: Authority) -> Self {
    Self {
      authority,
      domain: DomainClassification::classify(incoming.domain.as_deref()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pipeline_domains_match_case_insensitively() {
    assert_eq!(
      DomainClassification::classify(Some("self.biosampleimportena")),
      DomainClassification::EnaPipeline
    );
    assert_eq!(
      DomainClassification::classify(Some("SELF.BIOSAMPLEIMPORTNCBI")),
      DomainClassification::NcbiPipeline
    );
  }

  #[test]
  fn other_domains_are_interactive() {
    for domain in [None, Some(""), Some("self.lab42"), Some("self.BiosampleImportENA2")] {
      let class = DomainClassification::classify(domain);
      assert_eq!(class, DomainClassification::Interactive, "{domain:?}");
      assert!(!class.is_pipeline());
    }
  }

  #[test]
  fn authority_parsing() {
    assert_eq!(Authority::from_provider(Some("WEBIN")), Authority::Webin);
    assert_eq!(Authority::from_provider(Some("webin")), Authority::Webin);
    assert_eq!(Authority::from_provider(Some("AAP")), Authority::Other);
    assert_eq!(Authority::from_provider(Some("orcid")), Authority::Other);
    assert_eq!(Authority::from_provider(None), Authority::Other);
  }
}
