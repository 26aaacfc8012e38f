//! Configuration for the `biosamples` binary.
//!
//! Loaded from an optional TOML file layered with `BIOSAMPLES_*` environment
//! variables, e.g. `BIOSAMPLES_STORE_PATH=/data/samples.db`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Upper bound on concurrent submissions during AMR ingestion.
  #[serde(default = "default_ingest_concurrency")]
  pub ingest_concurrency: usize,
}

fn default_store_path() -> PathBuf { PathBuf::from("biosamples.db") }

fn default_ingest_concurrency() -> usize { 8 }

impl CliConfig {
  /// Read the config file at `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("BIOSAMPLES"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  /// The store path with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
