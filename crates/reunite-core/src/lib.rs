//! Core types and trait definitions for the Reunite case-matching ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod actor;
pub mod case;
pub mod error;
pub mod evidence;
pub mod identifier;
pub mod ledger;
pub mod lifecycle;
pub mod report;
pub mod stats;
pub mod store;
pub mod video;

pub use error::{Error, Result};
