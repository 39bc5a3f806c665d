//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `analysis` - Pure domain services for AHP decision analysis

pub mod analysis;
pub mod foundation;
