//! Curation overlay applied on the read path.
//!
//! Curation links are produced by external curation pipelines and stored next
//! to the sample; they are never merged into the stored record. On read, the
//! links selected by a [`ReadView`] are applied in creation order to a copy
//! of the record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  accession::Accession,
  sample::{Attribute, SampleRecord},
};

/// Which curations a read should apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadView {
  /// `None` applies curations from every domain; `Some` restricts to the
  /// listed domains, so an empty list reads the record as stored.
  pub curation_domains: Option<Vec<String>>,
  /// Restrict to curations recorded by this repository.
  pub curation_repo:    Option<String>,
}

impl ReadView {
  /// The record exactly as stored, with no curations.
  pub fn raw() -> Self {
    Self { curation_domains: Some(Vec::new()), curation_repo: None }
  }

  pub fn selects(&self, link: &CurationLink) -> bool {
    let domain_ok = self
      .curation_domains
      .as_ref()
      .is_none_or(|domains| domains.iter().any(|d| d == &link.domain));
    let repo_ok = self
      .curation_repo
      .as_ref()
      .is_none_or(|repo| link.repo.as_ref() == Some(repo));
    domain_ok && repo_ok
  }
}

/// A stored attribute rewrite for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationLink {
  pub curation_id:     Uuid,
  pub accession:       Accession,
  pub domain:          String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repo:            Option<String>,
  /// Attributes that must all be present for the curation to apply; they are
  /// removed when it does.
  pub attributes_pre:  BTreeSet<Attribute>,
  /// Attributes added when the curation applies.
  pub attributes_post: BTreeSet<Attribute>,
  pub created:         DateTime<Utc>,
}

/// Input to a store's `record_curation`; id and `created` are set by the
/// store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCurationLink {
  pub accession:       Accession,
  pub domain:          String,
  #[serde(default)]
  pub repo:            Option<String>,
  #[serde(default)]
  pub attributes_pre:  BTreeSet<Attribute>,
  #[serde(default)]
  pub attributes_post: BTreeSet<Attribute>,
}

impl CurationLink {
  pub fn applies_to(&self, record: &SampleRecord) -> bool {
    self.attributes_pre.is_subset(&record.attributes)
  }
}

/// Apply every link selected by `view`, oldest first, to a copy of `record`.
pub fn apply_curations<'a>(
  record: &SampleRecord,
  links: impl IntoIterator<Item = &'a CurationLink>,
  view: &ReadView,
) -> SampleRecord {
  let mut selected: Vec<&CurationLink> =
    links.into_iter().filter(|link| view.selects(link)).collect();
  selected.sort_by_key(|link| (link.created, link.curation_id));

  let attributes = selected.into_iter().fold(
    record.attributes.clone(),
    |attributes, link| {
      if !link.attributes_pre.is_subset(&attributes) {
        return attributes;
      }
      attributes
        .difference(&link.attributes_pre)
        .chain(link.attributes_post.iter())
        .cloned()
        .collect()
    },
  );

  SampleRecord { attributes, ..record.clone() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn link(
    domain: &str,
    repo: Option<&str>,
    pre: Attribute,
    post: Attribute,
    secs: i64,
  ) -> CurationLink {
    CurationLink {
      curation_id:     Uuid::new_v4(),
      accession:       Accession::from("SAMEA1"),
      domain:          domain.into(),
      repo:            repo.map(str::to_owned),
      attributes_pre:  [pre].into(),
      attributes_post: [post].into(),
      created:         Utc.timestamp_opt(secs, 0).unwrap(),
    }
  }

  fn sample() -> SampleRecord {
    SampleRecord::new("s").with_attribute(Attribute::new("organism", "human"))
  }

  #[test]
  fn default_view_applies_all_domains() {
    let links = [link(
      "self.zooma",
      None,
      Attribute::new("organism", "human"),
      Attribute::new("organism", "Homo sapiens")
        .with_iri("http://purl.obolibrary.org/obo/NCBITaxon_9606"),
      10,
    )];

    let curated = apply_curations(&sample(), &links, &ReadView::default());
    let attr = curated.attributes.iter().next().unwrap();
    assert_eq!(curated.attributes.len(), 1);
    assert_eq!(attr.value, "Homo sapiens");
    assert!(attr.iri.is_some());
  }

  #[test]
  fn raw_view_applies_nothing() {
    let links = [link(
      "self.zooma",
      None,
      Attribute::new("organism", "human"),
      Attribute::new("organism", "Homo sapiens"),
      10,
    )];
    let curated = apply_curations(&sample(), &links, &ReadView::raw());
    assert_eq!(curated, sample());
  }

  #[test]
  fn domain_and_repo_filters() {
    let links = [
      link(
        "self.a",
        Some("repo1"),
        Attribute::new("organism", "human"),
        Attribute::new("organism", "A"),
        10,
      ),
      link(
        "self.b",
        Some("repo2"),
        Attribute::new("organism", "human"),
        Attribute::new("organism", "B"),
        10,
      ),
    ];

    let only_b = ReadView {
      curation_domains: Some(vec!["self.b".into()]),
      curation_repo:    None,
    };
    let curated = apply_curations(&sample(), &links, &only_b);
    assert_eq!(curated.attributes.iter().next().unwrap().value, "B");

    let only_repo1 = ReadView { curation_domains: None, curation_repo: Some("repo1".into()) };
    let curated = apply_curations(&sample(), &links, &only_repo1);
    assert_eq!(curated.attributes.iter().next().unwrap().value, "A");
  }

  #[test]
  fn links_chain_in_creation_order() {
    let links = [
      link(
        "self.a",
        None,
        Attribute::new("organism", "Homo sapiens"),
        Attribute::new("organism", "Homo sapiens sapiens"),
        20,
      ),
      link(
        "self.a",
        None,
        Attribute::new("organism", "human"),
        Attribute::new("organism", "Homo sapiens"),
        10,
      ),
    ];
    let curated = apply_curations(&sample(), &links, &ReadView::default());
    assert_eq!(
      curated.attributes.iter().next().unwrap().value,
      "Homo sapiens sapiens"
    );
  }

  #[test]
  fn links_whose_precondition_fails_are_skipped() {
    let l = link(
      "self.a",
      None,
      Attribute::new("organism", "mouse"),
      Attribute::new("organism", "Mus musculus"),
      10,
    );
    assert!(!l.applies_to(&sample()));
    let curated = apply_curations(&sample(), [&l], &ReadView::default());
    assert_eq!(curated, sample());
  }
}
