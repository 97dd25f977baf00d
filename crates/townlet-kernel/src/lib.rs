//! The Townlet simulation kernel.
//!
//! Drives a persistent town of oracle-controlled NPCs through discrete
//! ticks. Each tick runs three bus phases in strict order: `pre_tick`
//! resolves queued action intents through the [`executor::ActionExecutor`],
//! `on_tick` durably marks and evicts processed events, and `post_tick`
//! asks every registered NPC callback for its next action. The kernel
//! is constructed with injected [`townlet_store::Stores`] handles and a
//! [`townlet_oracle::DecisionOracle`]; it owns no global state.
//!
//! # Modules
//!
//! - [`bus`] -- phased event bus and the [`bus::Subscriber`] trait
//! - [`clock`] -- [`clock::SimClock`] and sim-time mapping
//! - [`config`] -- TOML + env configuration
//! - [`decision`] -- per-NPC decision callbacks and registration
//! - [`error`] -- [`KernelError`]
//! - [`executor`] -- the seven action handlers and idle fallback
//! - [`runtime`] -- background worker with start/stop lifecycle

pub mod bus;
pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod executor;
pub mod runtime;

pub use bus::{BusContext, EventBus, Subscriber};
pub use clock::SimClock;
pub use config::{KernelConfig, WritePolicy};
pub use decision::{register_npc_callbacks, NpcDecisionCallback};
pub use error::KernelError;
pub use executor::ActionExecutor;
pub use runtime::KernelRuntime;
