//! [`SampleService`], the write engine's entry point.
//!
//! Every write is a short pipeline: validate, route to create or update,
//! allocate or merge, persist, notify, then read the record back through the
//! read path. The service holds no mutable state, so one instance can be
//! shared by any number of concurrent callers writing different accessions.

use chrono::Utc;

use crate::{
  Error, Result, ValidationError,
  accession::{Accession, AccessionAllocator, AccessionNamespace},
  curation::ReadView,
  domain::{Authority, DomainClassification, WriteContext},
  merge::merge,
  patch::StructuredDataPatch,
  provenance,
  sample::SampleRecord,
  store::{AccessionCounter, ChangeNotifier, SampleStore},
  validate::{SampleValidator, SchemaValidator},
};

fn store_error<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct SampleService<S, N, V = SchemaValidator> {
  store:     S,
  allocator: AccessionAllocator<S>,
  notifier:  N,
  validator: V,
}

impl<S, N> SampleService<S, N>
where
  S: SampleStore + AccessionCounter + Clone,
  N: ChangeNotifier,
{
  /// A service over `store` (also used as the accession counter) with the
  /// built-in [`SchemaValidator`].
  pub fn new(store: S, notifier: N) -> Self {
    Self {
      allocator: AccessionAllocator::new(store.clone()),
      store,
      notifier,
      validator: SchemaValidator,
    }
  }
}

impl<S, N, V> SampleService<S, N, V>
where
  S: SampleStore + AccessionCounter,
  N: ChangeNotifier,
  V: SampleValidator,
{
  /// Replace the validator.
  pub fn with_validator<W: SampleValidator>(
    self,
    validator: W,
  ) -> SampleService<S, N, W> {
    SampleService {
      store: self.store,
      allocator: self.allocator,
      notifier: self.notifier,
      validator,
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Read a record through the read path.
  pub async fn fetch(
    &self,
    accession: &Accession,
    view: &ReadView,
  ) -> Result<Option<SampleRecord>> {
    self
      .store
      .fetch(accession.clone(), view)
      .await
      .map_err(store_error)
  }

  pub async fn exists_by_domain_and_name(
    &self,
    domain: &str,
    name: &str,
  ) -> Result<bool> {
    self
      .store
      .exists_by_domain_and_name(domain, name)
      .await
      .map_err(store_error)
  }

  pub async fn is_not_existing_accession(
    &self,
    accession: &Accession,
  ) -> Result<bool> {
    let exists = self
      .store
      .exists(accession.clone())
      .await
      .map_err(store_error)?;
    Ok(!exists)
  }

  // ── Pre-write checks ──────────────────────────────────────────────────

  /// Decide whether writing `incoming` adds metadata for the first time.
  ///
  /// Callers pass the answer back into [`Self::store`].
  pub async fn before_store(&self, incoming: &SampleRecord) -> Result<bool> {
    let domain = DomainClassification::classify(incoming.domain.as_deref());

    let existing = match &incoming.accession {
      Some(accession) if !domain.is_pipeline() => self
        .store
        .load(accession.clone())
        .await
        .map_err(store_error)?,
      _ => None,
    };

    let first = provenance::is_first_metadata_added(existing.as_ref(), domain);
    if first {
      tracing::trace!(accession = ?incoming.accession, "first time metadata added");
    }
    Ok(first)
  }

  /// Validate an untyped JSON payload. Violations are joined with `"; "`.
  pub fn validate_document(&self, document: &serde_json::Value) -> Result<()> {
    let errors = self.validator.validate_document(document);
    if errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationError::joined(errors, "; ").into())
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Store a record, allocating an accession if it has none, and return the
  /// authoritative view read back from the store.
  ///
  /// `incoming.update` must already carry the write time.
  pub async fn store(
    &self,
    incoming: SampleRecord,
    is_group: bool,
    first_metadata_added: bool,
    authority: Authority,
  ) -> Result<SampleRecord> {
    let errors = self.validator.validate(&incoming);
    if !errors.is_empty() {
      tracing::error!(?errors, "sample validation failed");
      return Err(ValidationError::joined(errors, "|").into());
    }

    let accession = match incoming.accession.clone() {
      Some(accession) => {
        self
          .update(accession, incoming, first_metadata_added, authority)
          .await?
      }
      None => self.create(incoming, is_group).await?,
    };

    self.read_back(accession).await
  }

  async fn update(
    &self,
    accession: Accession,
    incoming: SampleRecord,
    first_metadata_added: bool,
    authority: Authority,
  ) -> Result<Accession> {
    let existing = self
      .store
      .load(accession.clone())
      .await
      .map_err(store_error)?;

    let (record, prior_targets) = match existing {
      Some(existing) => {
        let context = WriteContext::for_record(&incoming, authority);
        let prior_targets = existing.relationship_targets_from(&accession);
        let merged =
          merge(&incoming, &existing, first_metadata_added, &context);
        (merged, prior_targets)
      }
      None => {
        tracing::error!(
          %accession,
          "trying to update sample not in database, storing as given"
        );
        (incoming, Vec::new())
      }
    };

    self.store.save(record).await.map_err(store_error)?;
    tracing::debug!(%accession, ?prior_targets, "updated sample");
    self.notify(accession.clone(), prior_targets).await?;
    Ok(accession)
  }

  async fn create(
    &self,
    incoming: SampleRecord,
    is_group: bool,
  ) -> Result<Accession> {
    let namespace = if is_group {
      AccessionNamespace::Group
    } else {
      AccessionNamespace::Sample
    };
    let accession = self
      .allocator
      .allocate(namespace)
      .await
      .map_err(|e| Error::Allocator(Box::new(e)))?;
    tracing::info!(%accession, %namespace, "allocated accession");

    self
      .store
      .save(incoming.with_accession(accession.clone()))
      .await
      .map_err(store_error)?;
    self.notify(accession.clone(), Vec::new()).await?;
    Ok(accession)
  }

  /// Replace only the structured data of an existing record.
  pub async fn store_patch(
    &self,
    payload: SampleRecord,
    authority: Authority,
  ) -> Result<SampleRecord> {
    let patch = StructuredDataPatch::from_payload(payload)?;
    let accession = patch.accession().clone();

    let existing = self
      .store
      .load(accession.clone())
      .await
      .map_err(store_error)?;
    if existing.is_none() {
      tracing::error!(
        %accession,
        "trying to patch sample not in database, storing patch as the record"
      );
    }

    let tables = patch.structured_data().len();
    let record = patch.apply(existing.as_ref(), Utc::now());
    self.store.save(record).await.map_err(store_error)?;
    tracing::info!(%accession, %authority, tables, "stored structured data");

    self.read_back(accession).await
  }

  async fn notify(
    &self,
    accession: Accession,
    prior_targets: Vec<Accession>,
  ) -> Result<()> {
    self
      .notifier
      .notify(accession.clone(), prior_targets)
      .await
      .map_err(|e| {
        tracing::error!(%accession, error = %e, "change notification failed");
        Error::Notification { accession, source: Box::new(e) }
      })
  }

  async fn read_back(&self, accession: Accession) -> Result<SampleRecord> {
    self
      .fetch(&accession, &ReadView::default())
      .await?
      .ok_or(Error::MissingAfterWrite(accession))
  }
}
