//! Core types and the write engine for the BioSamples registry.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the sample record model, the provenance rules applied on every write, and
//! [`service::SampleService`], which strings accession allocation, merging and
//! persistence together over the collaborator traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod accession;
pub mod curation;
pub mod domain;
pub mod error;
pub mod merge;
pub mod patch;
pub mod provenance;
pub mod sample;
pub mod service;
pub mod store;
pub mod structured;
pub mod validate;

pub use error::{Error, Result, ValidationError};
