//! Data layer for the Townlet simulation.
//!
//! The kernel treats persistence as an external collaborator: it only
//! needs create/get/update/delete by id plus a handful of list-by-relation
//! queries per entity. This crate defines that contract as traits, the
//! shared error type, the text codec every composite field must round-trip
//! through, and an in-memory implementation used by tests and local wiring.
//!
//! # Modules
//!
//! - [`codec`] -- The explicit serialize/deserialize boundary (JSON text)
//! - [`error`] -- [`StoreError`] (`NotFound` / `Conflict` / `Codec`)
//! - [`memory`] -- [`InMemoryStore`], rows held as encoded text
//! - [`stores`] -- The per-entity store traits and the [`Stores`] bundle

pub mod codec;
pub mod error;
pub mod memory;
pub mod stores;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use stores::{
    EffectStore, EventStore, ItemStore, MemoryStore, NpcStore, PlaceStore, PlayerStore, RoadStore,
    Stores, TownStore,
};
