//! The decision oracle: how NPCs think.
//!
//! The kernel asks an external language model what each NPC does next.
//! This crate owns that whole boundary: the [`DecisionOracle`] trait the
//! kernel calls, the OpenAI-compatible HTTP backend, the compiled-in
//! prompt templates, and the total parser that turns raw oracle text
//! into a typed [`townlet_types::Action`] (falling back to `idle`).
//!
//! # Modules
//!
//! - [`client`] -- [`DecisionOracle`], [`HttpOracle`], [`ScriptedOracle`]
//! - [`error`] -- [`OracleError`]
//! - [`parse`] -- [`parse_action`], total over arbitrary input
//! - [`prompt`] -- [`PromptEngine`] and the built-in templates

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;

pub use client::{DecisionOracle, HttpOracle, HttpOracleConfig, ScriptedOracle};
pub use error::OracleError;
pub use parse::parse_action;
pub use prompt::PromptEngine;
