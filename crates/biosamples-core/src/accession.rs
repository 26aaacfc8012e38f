//! Accessions and the allocator that hands them out.
//!
//! An accession is assigned exactly once, when a record is first stored, and
//! never changes afterwards. Samples and groups draw from disjoint namespaces,
//! each backed by its own persistent counter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::AccessionCounter;

// ─── Accession ───────────────────────────────────────────────────────────────

/// A globally unique sample or group identifier, e.g. `SAMEA123`.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Accession(String);

impl Accession {
  pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The namespace this accession was allocated from, judged by prefix.
  pub fn namespace(&self) -> Option<AccessionNamespace> {
    [AccessionNamespace::Sample, AccessionNamespace::Group]
      .into_iter()
      .find(|ns| self.0.starts_with(ns.prefix()))
  }
}

impl fmt::Display for Accession {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Accession {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl From<String> for Accession {
  fn from(value: String) -> Self { Self(value) }
}

impl AsRef<str> for Accession {
  fn as_ref(&self) -> &str { &self.0 }
}

// ─── Namespaces ──────────────────────────────────────────────────────────────

/// The two disjoint accession namespaces.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessionNamespace {
  Sample,
  Group,
}

impl AccessionNamespace {
  pub fn prefix(self) -> &'static str {
    match self {
      Self::Sample => "SAMEA",
      Self::Group => "SAMEG",
    }
  }
}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Turns counter values into accessions.
///
/// Uniqueness rests entirely on the counter: each call to
/// [`AccessionCounter::increment`] must return a value never returned before
/// for that namespace.
#[derive(Debug, Clone)]
pub struct AccessionAllocator<C> {
  counter: C,
}

impl<C: AccessionCounter> AccessionAllocator<C> {
  pub fn new(counter: C) -> Self { Self { counter } }

  /// Allocate a fresh accession. Counter failures are returned unchanged.
  pub async fn allocate(
    &self,
    namespace: AccessionNamespace,
  ) -> Result<Accession, C::Error> {
    let value = self.counter.increment(namespace).await?;
    Ok(Accession(format!("{}{value}", namespace.prefix())))
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashSet,
    convert::Infallible,
    sync::{
      Arc,
      atomic::{AtomicU64, Ordering},
    },
  };

  use super::*;

  #[derive(Default)]
  struct AtomicCounter {
    sample: AtomicU64,
    group:  AtomicU64,
  }

  impl AccessionCounter for AtomicCounter {
    type Error = Infallible;

    async fn increment(
      &self,
      namespace: AccessionNamespace,
    ) -> Result<u64, Infallible> {
      let counter = match namespace {
        AccessionNamespace::Sample => &self.sample,
        AccessionNamespace::Group => &self.group,
      };
      Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
  }

  #[tokio::test]
  async fn namespaces_use_distinct_prefixes() {
    let allocator = AccessionAllocator::new(AtomicCounter::default());
    let sample = allocator.allocate(AccessionNamespace::Sample).await.unwrap();
    let group = allocator.allocate(AccessionNamespace::Group).await.unwrap();

    assert_eq!(sample.as_str(), "SAMEA1");
    assert_eq!(group.as_str(), "SAMEG1");
    assert_eq!(sample.namespace(), Some(AccessionNamespace::Sample));
    assert_eq!(group.namespace(), Some(AccessionNamespace::Group));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_allocations_are_distinct() {
    let allocator = Arc::new(AccessionAllocator::new(AtomicCounter::default()));

    let handles: Vec<_> = (0..200)
      .map(|_| {
        let allocator = allocator.clone();
        tokio::spawn(async move {
          allocator.allocate(AccessionNamespace::Sample).await.unwrap()
        })
      })
      .collect();

    let mut seen = HashSet::new();
    for handle in handles {
      assert!(seen.insert(handle.await.unwrap()));
    }
    assert_eq!(seen.len(), 200);
  }

  #[test]
  fn foreign_accessions_have_no_namespace() {
    assert_eq!(Accession::from("ERS000123").namespace(), None);
  }
}
