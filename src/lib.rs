//! Cadence – a deterministic activation scheduler for forward-chaining
//! production rule engines
//!
//! This crate implements the agenda core of a rule engine:
//! - Activations: candidate rule firings under a deterministic total order
//!   (salience first, creation order as the tie-break)
//! - Agenda groups: named, stack-ordered focus phases; only the focused
//!   group yields activations to fire
//! - Activation groups: named mutual-exclusion sets; firing one member
//!   cancels the rest
//! - A synchronous firing protocol with idempotent cancellation and
//!   event-listener hooks
//!
//! Pattern matching, rule compilation, and the firing loop itself are
//! external collaborators: the matcher reports and withdraws matches, the
//! loop asks for the next activation and fires it.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Engine core modules implementing the activation scheduler
pub mod engine;

// Re-export key types for convenience
pub use engine::{Match, Session, SessionConfig};

/// Current version of the cadence engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
