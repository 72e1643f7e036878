//! `tollgate-core` — shared error model and message catalogue.
//!
//! This crate has no IO and no async; every other crate builds on it.

pub mod error;
pub mod messages;

pub use error::{ClientError, ClientResult, ErrorCategory};
