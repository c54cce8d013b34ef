//! Error classes surfaced by the generation engine.
//!
//! The generator distinguishes programming errors (an adapter breaking its
//! contract), configuration errors (caught at construction), and operational
//! errors (OS resource limits hit during parallel dispatch). Everything a
//! backend raises on its own behalf travels through the `Backend` variant
//! untouched.

use thiserror::Error;

/// Errors raised by [`Generator`](crate::generator::Generator) and its
/// supporting pieces.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A backend returned a response violating the structural contract
    /// (e.g. more than one output for a single-generation call). This is a
    /// bug in the backend adapter and is never retried.
    #[error("backend contract violation: {0}")]
    ContractViolation(String),

    /// The generator configuration is inconsistent, e.g. parallel requests
    /// enabled without a worker cap.
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// Parallel dispatch hit an OS-level concurrency limit. Callers should
    /// abort rather than continue with fewer outputs than requested.
    #[error("generation resources exhausted: {0}")]
    ResourceExhausted(String),

    /// Any error the backend adapter raised while producing outputs.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
