//! Shared type definitions for the Townlet simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Townlet workspace: entity identifiers, enumerations, entity structs,
//! the closed action sum type, and the event record that flows through
//! the kernel's event bus.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe string-backed wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (status, tags, item kinds, event types)
//! - [`entities`] -- Core entity structs (NPCs, places, items, effects, roads)
//! - [`action`] -- The closed sum type over the seven NPC actions
//! - [`event`] -- The event record and its typed payload

pub mod action;
pub mod entities;
pub mod enums;
pub mod event;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use action::Action;
pub use entities::{Effect, Item, MemoryEntry, Npc, Place, Player, Road, Town};
pub use enums::{EffectAttribute, EventType, ItemType, NpcStatus, PlaceTag};
pub use event::{Event, EventPayload};
pub use ids::{EffectId, EventId, ItemId, NpcId, PlaceId, PlayerId, RoadId, TownId};
