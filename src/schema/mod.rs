//! Raw interaction stream schema
//!
//! This module defines the boundary input for the pipeline: a sequence of
//! `(kind, key | position, timestamp)` tuples produced by whatever captures
//! input events on the host. Parsing and diagnostics live here; the capture
//! session itself never rejects input.

mod adapter;
mod raw_interaction;

pub use adapter::*;
pub use raw_interaction::*;
