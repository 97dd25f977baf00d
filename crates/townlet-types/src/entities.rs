//! Core entity structs persisted by the store.
//!
//! Invariants maintained by the kernel rather than by these structs:
//! inventory counts are never negative and keys are removed when a count
//! drops to zero; hunger/energy/mood stay within `[0, 100]`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EffectAttribute, ItemType, NpcStatus, PlaceTag};
use crate::ids::{EffectId, ItemId, NpcId, PlaceId, PlayerId, RoadId, TownId};

/// Persistent NPC state and metadata.
///
/// Attribute fields are mutated exclusively through the action executor
/// and the effect engine; both clamp to `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Identifier.
    pub id: NpcId,
    /// Owning player, if any.
    pub player_id: Option<PlayerId>,
    /// Display name used in prompts and memory entries.
    pub name: String,
    /// Current place.
    pub location_id: PlaceId,
    /// Coarse status tag.
    #[serde(default)]
    pub status: NpcStatus,
    /// Satiety in `[0, 100]`.
    pub hunger: u8,
    /// Stamina in `[0, 100]`.
    pub energy: u8,
    /// Morale in `[0, 100]`.
    pub mood: u8,
    /// Carried items: item id to count. Counts are strictly positive.
    #[serde(default)]
    pub inventory: BTreeMap<ItemId, u32>,
    /// Accumulated free-text memory, periodically summarized.
    #[serde(default)]
    pub long_memory: String,
    /// Whether the NPC is dead; dead NPCs make no decisions.
    #[serde(default)]
    pub is_dead: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Npc {
    /// Create a new NPC at a place with full attributes.
    pub fn new(name: impl Into<String>, location_id: PlaceId) -> Self {
        Self {
            id: NpcId::new(),
            player_id: None,
            name: name.into(),
            location_id,
            status: NpcStatus::Peaceful,
            hunger: 100,
            energy: 100,
            mood: 100,
            inventory: BTreeMap::new(),
            long_memory: String::new(),
            is_dead: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A node in the town graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Identifier.
    pub id: PlaceId,
    /// Display name.
    pub name: String,
    /// Capability tags gating which actions are legal here.
    #[serde(default)]
    pub tags: BTreeSet<PlaceTag>,
    /// Stock available for purchase, item id to count.
    #[serde(default)]
    pub shop_inventory: BTreeMap<ItemId, u32>,
}

impl Place {
    /// Create a tagless place with an empty shop.
    pub fn new(id: PlaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tags: BTreeSet::new(),
            shop_inventory: BTreeMap::new(),
        }
    }

    /// Whether the place carries the given tag.
    pub fn has_tag(&self, tag: PlaceTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// An item in the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Price in base currency units.
    #[serde(default)]
    pub value: u64,
    /// Item kind.
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    /// Effects applied, in order, when the item is consumed.
    #[serde(default)]
    pub effect_ids: Vec<EffectId>,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
}

/// A single attribute delta attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Identifier.
    pub id: EffectId,
    /// Display name.
    pub name: String,
    /// The attribute this effect mutates.
    pub attribute: EffectAttribute,
    /// Signed delta applied per unit consumed; the result is clamped.
    pub change: i32,
}

/// An undirected edge in the town graph. Movement between two places is
/// legal when a road touches both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    /// Identifier.
    pub id: RoadId,
    /// One endpoint.
    pub from_place: PlaceId,
    /// The other endpoint.
    pub to_place: PlaceId,
    /// Free-text compass hint used in prompts.
    #[serde(default)]
    pub direction: String,
}

impl Road {
    /// Whether this road touches the given place.
    pub fn touches(&self, place: &PlaceId) -> bool {
        self.from_place == *place || self.to_place == *place
    }

    /// Whether this road connects the two given places (in either order).
    pub fn connects(&self, a: &PlaceId, b: &PlaceId) -> bool {
        (self.from_place == *a && self.to_place == *b)
            || (self.from_place == *b && self.to_place == *a)
    }
}

/// One append-only memory record for an NPC. Never mutated; deleted only
/// by explicit admin action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Store-assigned identifier; `None` until persisted.
    #[serde(default)]
    pub id: Option<i64>,
    /// The NPC this memory belongs to.
    pub npc_id: NpcId,
    /// Natural-language description of what happened.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create a fresh, unpersisted memory entry stamped now.
    pub fn new(npc_id: NpcId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            npc_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A human player owning NPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The town record; holds the recorded simulation start time used for
/// wall-clock to sim-time mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Town {
    /// Identifier.
    pub id: TownId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
    /// Wall-clock instant the clock was last started; set by the clock.
    #[serde(default)]
    pub sim_start_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn road_connects_either_direction() {
        let home = PlaceId::from("place:home");
        let work = PlaceId::from("place:work");
        let road = Road {
            id: RoadId::from("road:main"),
            from_place: home.clone(),
            to_place: work.clone(),
            direction: String::from("east"),
        };
        assert!(road.connects(&home, &work));
        assert!(road.connects(&work, &home));
        assert!(!road.connects(&home, &PlaceId::from("place:tavern")));
    }

    #[test]
    fn new_npc_starts_full_and_peaceful() {
        let npc = Npc::new("Ada", PlaceId::from("place:home"));
        assert_eq!(npc.hunger, 100);
        assert_eq!(npc.energy, 100);
        assert_eq!(npc.mood, 100);
        assert_eq!(npc.status, NpcStatus::Peaceful);
        assert!(!npc.is_dead);
        assert!(npc.inventory.is_empty());
    }

    #[test]
    fn item_type_serializes_under_type_key() {
        let item = Item {
            id: ItemId::from("item:bread"),
            name: String::from("Bread"),
            value: 5,
            item_type: ItemType::Consumable,
            effect_ids: vec![],
            description: String::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("CONSUMABLE"));
    }
}
