//! Type-safe identifier wrappers for all entities.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. The static catalog
//! uses human-readable ids (`place:home`, `item:bronze_coin`), so the
//! wrappers are string-backed rather than raw UUIDs. Fresh ids are
//! minted as `<prefix>:<uuid-v4>`.
//!
//! [`EventId`] is the exception: the store assigns a monotonically
//! increasing integer id when an event is first persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a string-backed newtype identifier with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh identifier under this entity's prefix.
            pub fn new() -> Self {
                Self(format!(concat!($prefix, ":{}"), Uuid::new_v4()))
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner string value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an NPC.
    NpcId, "npc"
}

define_id! {
    /// Unique identifier for a player controlling one or more NPCs.
    PlayerId, "player"
}

define_id! {
    /// Unique identifier for a place (node in the town graph).
    PlaceId, "place"
}

define_id! {
    /// Unique identifier for an item in the static catalog.
    ItemId, "item"
}

define_id! {
    /// Unique identifier for an item effect.
    EffectId, "effect"
}

define_id! {
    /// Unique identifier for a road (edge in the town graph).
    RoadId, "road"
}

define_id! {
    /// Unique identifier for a town.
    TownId, "town"
}

/// Store-assigned identifier for an event record.
///
/// `None` on a freshly constructed [`crate::Event`]; the event store
/// assigns the durable id on first persist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl EventId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
