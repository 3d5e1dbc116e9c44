//! Core types and client wiring for the Ridwell pickup service.

/// Domain models and identifiers shared across the workspace.
pub mod model;
/// Traits describing the backend interface, plus the shared error type.
pub mod ports;
/// Caller-facing client facade and the account/event objects it hands out.
pub mod service;

pub use model::*;
pub use ports::*;
pub use service::*;
