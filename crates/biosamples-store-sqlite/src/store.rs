//! [`SqliteStore`]: the SQLite implementation of the engine's collaborators.

use std::path::Path;

use biosamples_core::{
  accession::{Accession, AccessionNamespace},
  curation::{CurationLink, NewCurationLink, ReadView, apply_curations},
  sample::{Relationship, SampleRecord},
  store::{AccessionCounter, ChangeEvent, ChangeNotifier, SampleStore},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawChangeEvent, RawCurationLink, RawRelationship, decode_document,
    encode_accessions, encode_attributes, encode_document, encode_dt,
    encode_namespace, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sample store, accession counter and change outbox backed by a single
/// SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Curations ─────────────────────────────────────────────────────────

  /// Store a curation link for later application on the read path. The
  /// sample itself is left untouched.
  pub async fn record_curation(&self, input: NewCurationLink) -> Result<CurationLink> {
    let link = CurationLink {
      curation_id:     Uuid::new_v4(),
      accession:       input.accession,
      domain:          input.domain,
      repo:            input.repo,
      attributes_pre:  input.attributes_pre,
      attributes_post: input.attributes_post,
      created:         Utc::now(),
    };

    let id_str        = encode_uuid(link.curation_id);
    let accession_str = link.accession.as_str().to_owned();
    let domain        = link.domain.clone();
    let repo          = link.repo.clone();
    let pre_str       = encode_attributes(&link.attributes_pre)?;
    let post_str      = encode_attributes(&link.attributes_post)?;
    let created_str   = encode_dt(link.created);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO curation_links (
             curation_id, accession, domain, repo,
             attributes_pre, attributes_post, created
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            accession_str,
            domain,
            repo,
            pre_str,
            post_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(accession = %link.accession, curation = %link.curation_id, "recorded curation");
    Ok(link)
  }

  async fn curation_links(&self, accession: &Accession) -> Result<Vec<CurationLink>> {
    let accession_str = accession.as_str().to_owned();

    let raws: Vec<RawCurationLink> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT curation_id, accession, domain, repo,
                  attributes_pre, attributes_post, created
           FROM curation_links
           WHERE accession = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![accession_str], |row| {
            Ok(RawCurationLink {
              curation_id:     row.get(0)?,
              accession:       row.get(1)?,
              domain:          row.get(2)?,
              repo:            row.get(3)?,
              attributes_pre:  row.get(4)?,
              attributes_post: row.get(5)?,
              created:         row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCurationLink::into_link).collect()
  }

  // ── Relationships ─────────────────────────────────────────────────────

  /// Edges stored on other records that point at `accession`.
  async fn inverse_relationships(
    &self,
    accession: &Accession,
  ) -> Result<Vec<Relationship>> {
    let accession_str = accession.as_str().to_owned();

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT source, rel_type, target
           FROM relationships
           WHERE target = ?1 AND owner != ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![accession_str], |row| {
            Ok(RawRelationship {
              source:   row.get(0)?,
              rel_type: row.get(1)?,
              target:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawRelationship::into_relationship).collect())
  }

  // ── Outbox ────────────────────────────────────────────────────────────

  /// Every recorded change event, oldest first.
  pub async fn change_events(&self) -> Result<Vec<ChangeEvent>> {
    let raws: Vec<RawChangeEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, accession, prior_targets, recorded_at
           FROM change_events
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawChangeEvent {
              event_id:      row.get(0)?,
              accession:     row.get(1)?,
              prior_targets: row.get(2)?,
              recorded_at:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChangeEvent::into_event).collect()
  }
}

// ─── SampleStore impl ────────────────────────────────────────────────────────

impl SampleStore for SqliteStore {
  type Error = Error;

  async fn load(&self, accession: Accession) -> Result<Option<SampleRecord>> {
    let accession_str = accession.as_str().to_owned();

    let document: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT document FROM samples WHERE accession = ?1",
            rusqlite::params![accession_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    document.as_deref().map(decode_document).transpose()
  }

  async fn save(&self, record: SampleRecord) -> Result<SampleRecord> {
    let Some(accession) = record.accession.clone() else {
      return Err(Error::MissingAccession(record.name));
    };

    let accession_str = accession.as_str().to_owned();
    let name          = record.name.clone();
    let domain        = record.domain.clone();
    let document_str  = encode_document(&record)?;
    let saved_at_str  = encode_dt(Utc::now());
    let edges: Vec<(String, String, String)> = record
      .relationships
      .iter()
      .map(|rel| {
        (
          rel.source.as_str().to_owned(),
          rel.rel_type.clone(),
          rel.target.as_str().to_owned(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO samples (accession, name, domain, document, saved_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (accession) DO UPDATE SET
             name     = excluded.name,
             domain   = excluded.domain,
             document = excluded.document,
             saved_at = excluded.saved_at",
          rusqlite::params![accession_str, name, domain, document_str, saved_at_str],
        )?;
        tx.execute(
          "DELETE FROM relationships WHERE owner = ?1",
          rusqlite::params![accession_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO relationships (owner, source, rel_type, target)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (source, rel_type, target) in &edges {
            stmt.execute(rusqlite::params![accession_str, source, rel_type, target])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(%accession, "saved sample");
    Ok(record)
  }

  async fn exists(&self, accession: Accession) -> Result<bool> {
    let accession_str = accession.as_str().to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM samples WHERE accession = ?1",
            rusqlite::params![accession_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  async fn exists_by_domain_and_name(&self, domain: &str, name: &str) -> Result<bool> {
    let domain = domain.to_owned();
    let name   = name.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM samples WHERE domain = ?1 AND name = ?2 LIMIT 1",
            rusqlite::params![domain, name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  async fn fetch(
    &self,
    accession: Accession,
    view: &ReadView,
  ) -> Result<Option<SampleRecord>> {
    let Some(record) = self.load(accession.clone()).await? else {
      return Ok(None);
    };

    let links   = self.curation_links(&accession).await?;
    let inverse = self.inverse_relationships(&accession).await?;

    let mut curated = apply_curations(&record, &links, view);
    curated.relationships.extend(inverse);
    Ok(Some(curated))
  }
}

// ─── AccessionCounter impl ───────────────────────────────────────────────────

impl AccessionCounter for SqliteStore {
  type Error = Error;

  /// One `UPDATE … RETURNING` statement on the single connection thread, so
  /// concurrent callers can never observe the same value.
  async fn increment(&self, namespace: AccessionNamespace) -> Result<u64> {
    let key = encode_namespace(namespace);

    let value: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "UPDATE accession_counters
           SET next_value = next_value + 1
           WHERE namespace = ?1
           RETURNING next_value - 1",
          rusqlite::params![key],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(value as u64)
  }
}

// ─── ChangeNotifier impl ─────────────────────────────────────────────────────

impl ChangeNotifier for SqliteStore {
  type Error = Error;

  /// Append the event to the `change_events` outbox.
  async fn notify(
    &self,
    accession: Accession,
    prior_targets: Vec<Accession>,
  ) -> Result<()> {
    let event = ChangeEvent {
      event_id: Uuid::new_v4(),
      accession,
      prior_targets,
      recorded_at: Utc::now(),
    };

    let id_str        = encode_uuid(event.event_id);
    let accession_str = event.accession.as_str().to_owned();
    let targets_str   = encode_accessions(&event.prior_targets)?;
    let at_str        = encode_dt(event.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO change_events (event_id, accession, prior_targets, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, accession_str, targets_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(accession = %event.accession, targets = event.prior_targets.len(), "queued change event");
    Ok(())
  }
}
