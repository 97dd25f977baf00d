//! Error types for the simulation kernel.
//!
//! Store and oracle failures wrap their source errors. Clock misuse is
//! a configuration error surfaced at `start` time. Domain rejections
//! inside action handlers are not errors at all; they are boolean
//! outcomes that downgrade to `idle`.

use townlet_oracle::OracleError;
use townlet_store::StoreError;

/// Errors that can occur while driving the simulation.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The decision oracle failed in a context where it cannot be
    /// downgraded to `idle` (template compilation, backend setup).
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The configured tick interval is negative.
    #[error("tick interval must be non-negative, got {seconds}s")]
    InvalidTickInterval {
        /// The offending configured value.
        seconds: i64,
    },

    /// Sim time was requested before the clock ever started.
    #[error("town {town_id} has no recorded sim start time")]
    ClockNotStarted {
        /// The town whose start time is missing.
        town_id: String,
    },

    /// Configuration failed to load or deserialize.
    #[error("config error: {0}")]
    Config(String),
}
