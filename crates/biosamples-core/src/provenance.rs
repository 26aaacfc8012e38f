//! Provenance rules: which `create` and `submitted` timestamps survive when a
//! record is rewritten.
//!
//! Every function here is pure: the answer depends only on the arguments, so
//! the same write yields the same timestamps whichever actor performs it.
//!
//! | domain | `create` (non-Webin) | `submitted` |
//! |--------|----------------------|-------------|
//! | NCBI   | incoming → existing → existing.update | incoming → existing → existing.create |
//! | ENA    | existing → incoming | existing → incoming |
//! | other  | existing → existing.update | see [`derive_submitted`] |
//!
//! Under Webin authority `create` always takes the last row, whatever the
//! domain.

use chrono::{DateTime, Utc};

use crate::{
  domain::{Authority, DomainClassification, WriteContext},
  sample::SampleRecord,
};

type Timestamp = Option<DateTime<Utc>>;

/// Whether this write is the first to attach substantive metadata.
///
/// Pipeline imports never count. Otherwise the answer is `true` unless a
/// stored version exists and already carries a positive taxonomy id or any
/// attributes, relationships, publications, contacts or organizations.
pub fn is_first_metadata_added(
  existing: Option<&SampleRecord>,
  domain: DomainClassification,
) -> bool {
  if domain.is_pipeline() {
    return false;
  }
  existing.is_none_or(|existing| !has_metadata(existing))
}

fn has_metadata(record: &SampleRecord) -> bool {
  record.tax_id.is_some_and(|id| id > 0)
    || !record.attributes.is_empty()
    || !record.relationships.is_empty()
    || !record.publications.is_empty()
    || !record.contacts.is_empty()
    || !record.organizations.is_empty()
}

/// The `create` timestamp for a rewrite of `existing`.
pub fn derive_create(
  incoming: &SampleRecord,
  existing: &SampleRecord,
  authority: Authority,
  domain: DomainClassification,
) -> Timestamp {
  // Webin writes skip the pipeline rules entirely, even for pipeline domains.
  if !authority.is_webin() {
    match domain {
      DomainClassification::NcbiPipeline => {
        return incoming.create.or(existing.create).or(existing.update);
      }
      DomainClassification::EnaPipeline => {
        return existing.create.or(incoming.create);
      }
      DomainClassification::Interactive => {}
    }
  }
  existing.create.or(existing.update)
}

/// The `submitted` timestamp for a rewrite of `existing`.
pub fn derive_submitted(
  incoming: &SampleRecord,
  existing: &SampleRecord,
  first_metadata_added: bool,
  domain: DomainClassification,
) -> Timestamp {
  match domain {
    DomainClassification::NcbiPipeline => {
      incoming.submitted.or(existing.submitted).or(existing.create)
    }
    DomainClassification::EnaPipeline => {
      existing.submitted.or(incoming.submitted)
    }
    DomainClassification::Interactive if first_metadata_added => {
      incoming.submitted
    }
    DomainClassification::Interactive => {
      existing.submitted.or(existing.create).or(existing.update)
    }
  }
}

/// The derived timestamps for one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
  pub create:    Timestamp,
  pub submitted: Timestamp,
}

/// Derive both timestamps for a write in `context`.
pub fn resolve(
  incoming: &SampleRecord,
  existing: &SampleRecord,
  first_metadata_added: bool,
  context: &WriteContext,
) -> Provenance {
  Provenance {
    create:    derive_create(
      incoming,
      existing,
      context.authority,
      context.domain,
    ),
    submitted: derive_submitted(
      incoming,
      existing,
      first_metadata_added,
      context.domain,
    ),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{
    domain::DomainClassification::{EnaPipeline, Interactive, NcbiPipeline},
    sample::{Attribute, Contact, Organization, Publication, Relationship},
  };

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  fn record() -> SampleRecord { SampleRecord::new("sample") }

  // ── is_first_metadata_added ───────────────────────────────────────────

  #[test]
  fn pipeline_domains_never_count_as_first_metadata() {
    let bare = record();
    let rich = record()
      .with_attribute(Attribute::new("organism", "Homo sapiens"));
    for domain in [EnaPipeline, NcbiPipeline] {
      assert!(!is_first_metadata_added(None, domain));
      assert!(!is_first_metadata_added(Some(&bare), domain));
      assert!(!is_first_metadata_added(Some(&rich), domain));
    }
  }

  #[test]
  fn no_existing_version_is_first_metadata() {
    assert!(is_first_metadata_added(None, Interactive));
  }

  #[test]
  fn bare_existing_version_is_first_metadata() {
    let existing = record().with_create(Some(at(2020, 1, 1)));
    assert!(is_first_metadata_added(Some(&existing), Interactive));
  }

  #[test]
  fn taxonomy_id_suppresses_first_metadata() {
    let existing = SampleRecord { tax_id: Some(9606), ..record() };
    assert!(!is_first_metadata_added(Some(&existing), Interactive));
  }

  #[test]
  fn zero_taxonomy_id_does_not_count() {
    let existing = SampleRecord { tax_id: Some(0), ..record() };
    assert!(is_first_metadata_added(Some(&existing), Interactive));
  }

  #[test]
  fn each_kind_of_content_suppresses_first_metadata() {
    let with_content = [
      record().with_attribute(Attribute::new("tissue", "liver")),
      record().with_relationship(Relationship::new("SAMEA1", "derived from", "SAMEA2")),
      SampleRecord {
        publications: [Publication { doi: Some("10.1/x".into()), pubmed_id: None }].into(),
        ..record()
      },
      SampleRecord {
        contacts: [Contact { email: Some("a@example.org".into()), ..Contact::default() }]
          .into(),
        ..record()
      },
      SampleRecord {
        organizations: [Organization { name: Some("EBI".into()), ..Organization::default() }]
          .into(),
        ..record()
      },
    ];
    for existing in &with_content {
      assert!(!is_first_metadata_added(Some(existing), Interactive), "{existing:?}");
    }
  }

  // ── derive_create ─────────────────────────────────────────────────────

  #[test]
  fn ncbi_create_falls_back_to_existing_create() {
    let incoming = record();
    let existing = record().with_create(Some(at(2021, 1, 1)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, NcbiPipeline),
      Some(at(2021, 1, 1))
    );
  }

  #[test]
  fn ncbi_create_prefers_incoming() {
    let incoming = record().with_create(Some(at(2019, 5, 5)));
    let existing = record().with_create(Some(at(2021, 1, 1)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, NcbiPipeline),
      Some(at(2019, 5, 5))
    );
  }

  #[test]
  fn ncbi_create_falls_back_to_existing_update() {
    let incoming = record();
    let existing = record().with_update(Some(at(2021, 3, 3)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, NcbiPipeline),
      Some(at(2021, 3, 3))
    );
  }

  #[test]
  fn ena_create_takes_incoming_when_existing_has_none() {
    let incoming = record().with_create(Some(at(2022, 6, 1)));
    let existing = record().with_update(Some(at(2023, 1, 1)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, EnaPipeline),
      Some(at(2022, 6, 1))
    );
  }

  #[test]
  fn ena_create_keeps_existing() {
    let incoming = record().with_create(Some(at(2022, 6, 1)));
    let existing = record().with_create(Some(at(2018, 1, 1)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, EnaPipeline),
      Some(at(2018, 1, 1))
    );
  }

  #[test]
  fn webin_skips_pipeline_create_rules() {
    let incoming = record().with_create(Some(at(2022, 6, 1)));
    let without_create = record().with_update(Some(at(2023, 1, 1)));
    let with_create = record()
      .with_create(Some(at(2020, 2, 2)))
      .with_update(Some(at(2023, 1, 1)));

    for domain in [EnaPipeline, NcbiPipeline, Interactive] {
      assert_eq!(
        derive_create(&incoming, &without_create, Authority::Webin, domain),
        Some(at(2023, 1, 1)),
        "{domain}"
      );
      assert_eq!(
        derive_create(&incoming, &with_create, Authority::Webin, domain),
        Some(at(2020, 2, 2)),
        "{domain}"
      );
    }
  }

  #[test]
  fn interactive_create_ignores_incoming() {
    let incoming = record().with_create(Some(at(2030, 1, 1)));
    let existing = record().with_update(Some(at(2021, 1, 1)));
    assert_eq!(
      derive_create(&incoming, &existing, Authority::Other, Interactive),
      Some(at(2021, 1, 1))
    );
  }

  // ── derive_submitted ──────────────────────────────────────────────────

  #[test]
  fn first_metadata_takes_incoming_submitted() {
    let incoming = record().with_submitted(Some(at(2024, 4, 4)));
    let existing = record().with_submitted(Some(at(2020, 1, 1)));
    assert_eq!(
      derive_submitted(&incoming, &existing, true, Interactive),
      Some(at(2024, 4, 4))
    );
  }

  #[test]
  fn first_metadata_keeps_absent_incoming_submitted() {
    let incoming = record();
    let existing = record().with_submitted(Some(at(2020, 1, 1)));
    assert_eq!(derive_submitted(&incoming, &existing, true, Interactive), None);
  }

  #[test]
  fn later_interactive_writes_keep_history() {
    let incoming = record().with_submitted(Some(at(2024, 4, 4)));
    let existing = record()
      .with_create(Some(at(2019, 1, 1)))
      .with_update(Some(at(2020, 1, 1)));
    assert_eq!(
      derive_submitted(&incoming, &existing, false, Interactive),
      Some(at(2019, 1, 1))
    );

    let only_update = record().with_update(Some(at(2020, 1, 1)));
    assert_eq!(
      derive_submitted(&incoming, &only_update, false, Interactive),
      Some(at(2020, 1, 1))
    );
  }

  #[test]
  fn ncbi_submitted_chain() {
    let existing = record()
      .with_create(Some(at(2010, 1, 1)))
      .with_submitted(Some(at(2011, 1, 1)));
    let bare_existing = record().with_create(Some(at(2010, 1, 1)));

    let incoming = record().with_submitted(Some(at(2012, 1, 1)));
    assert_eq!(
      derive_submitted(&incoming, &existing, false, NcbiPipeline),
      Some(at(2012, 1, 1))
    );
    assert_eq!(
      derive_submitted(&record(), &existing, false, NcbiPipeline),
      Some(at(2011, 1, 1))
    );
    assert_eq!(
      derive_submitted(&record(), &bare_existing, false, NcbiPipeline),
      Some(at(2010, 1, 1))
    );
  }

  #[test]
  fn ena_submitted_prefers_existing() {
    let incoming = record().with_submitted(Some(at(2012, 1, 1)));
    let existing = record().with_submitted(Some(at(2011, 1, 1)));
    assert_eq!(
      derive_submitted(&incoming, &existing, true, EnaPipeline),
      Some(at(2011, 1, 1))
    );
    assert_eq!(
      derive_submitted(&incoming, &record(), true, EnaPipeline),
      Some(at(2012, 1, 1))
    );
  }

  // ── ordering ──────────────────────────────────────────────────────────

  #[test]
  fn ordered_inputs_stay_ordered() {
    let existing = record()
      .with_create(Some(at(2020, 1, 1)))
      .with_submitted(Some(at(2020, 2, 1)))
      .with_update(Some(at(2020, 3, 1)));
    let incoming = record()
      .with_create(Some(at(2020, 1, 1)))
      .with_submitted(Some(at(2020, 2, 1)))
      .with_update(Some(at(2024, 1, 1)));

    for domain in [Interactive, EnaPipeline, NcbiPipeline] {
      for authority in [Authority::Webin, Authority::Other] {
        for first in [true, false] {
          let context = WriteContext { authority, domain };
          let p = resolve(&incoming, &existing, first, &context);
          let (create, submitted) = (p.create.unwrap(), p.submitted.unwrap());
          assert!(create <= submitted, "{domain} {authority} {first}");
          assert!(submitted <= incoming.update.unwrap());
        }
      }
    }
  }
}
