//! Core types shared across Relay facilities
//!
//! This crate provides foundational types used by the error, logging and
//! pipeline crates:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys, event and operation names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
