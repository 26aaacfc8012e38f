//! SQLite backend for the BioSamples write engine.
//!
//! [`SqliteStore`] implements every collaborator the engine needs: the sample
//! store, the accession counters and a change-event outbox. It wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
