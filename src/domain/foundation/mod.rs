//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, event infrastructure, and error types
//! that form the vocabulary shared by the analysis domain and its callers.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::AnalysisId;
pub use timestamp::Timestamp;
