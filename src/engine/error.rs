//! Error types for the cadence engine
//!
//! Domain errors use thiserror and convert into a single top-level
//! `EngineError` at the session boundary. Consequence callbacks report
//! application failures through `anyhow`; those surface as a `FireError`
//! with the original error as source.

use thiserror::Error;

use super::activation::ActivationId;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Agenda bookkeeping errors
    #[error("Agenda error: {0}")]
    Agenda(#[from] AgendaError),

    /// Firing protocol errors
    #[error("Fire error: {0}")]
    Fire(#[from] FireError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Agenda bookkeeping errors
///
/// These indicate a desynchronized producer/agenda pair and are surfaced
/// immediately rather than absorbed.
#[derive(Debug, Error)]
pub enum AgendaError {
    /// An activation was inserted into a queue it already occupies
    #[error("duplicate activation: #{0} is already queued")]
    DuplicateActivation(ActivationId),

    /// A match referenced rule or tuple state that is inconsistent
    #[error("invalid activation: {0}")]
    InvalidActivation(String),
}

/// Convenience result alias for agenda operations
pub type AgendaResult<T> = std::result::Result<T, AgendaError>;

/// Firing protocol errors
#[derive(Debug, Error)]
pub enum FireError {
    /// Fire request for an activation handle the agenda does not know
    #[error("invalid fire request: activation #{0} is unknown")]
    Unknown(ActivationId),

    /// Fire request for an activation that is not queued
    #[error("invalid fire request: activation #{0} is not queued")]
    NotQueued(ActivationId),

    /// Fire request for a canceled activation
    #[error("invalid fire request: activation #{0} is canceled")]
    Canceled(ActivationId),

    /// The consequence callback reported a failure
    ///
    /// Agenda bookkeeping (dequeue, exclusion cancellation) has already
    /// committed by the time the callback runs.
    #[error("consequence of rule '{rule}' failed: {source}")]
    Consequence {
        /// Rule whose consequence failed
        rule: String,
        /// Error reported by the callback
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience result alias for firing operations
pub type FireResult<T> = std::result::Result<T, FireError>;

/// Result type using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
