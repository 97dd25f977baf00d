//! Per-entity store traits and the injected [`Stores`] bundle.
//!
//! The kernel is constructed with a `Stores` bundle of trait-object
//! handles rather than resolving a process-wide default connection, so
//! tests can wire an [`crate::InMemoryStore`] and production can wire a
//! relational backend without touching kernel code.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use townlet_types::{
    Effect, EffectId, Event, EventId, Item, ItemId, MemoryEntry, Npc, NpcId, Place, PlaceId,
    Player, PlayerId, Road, RoadId, Town, TownId,
};

use crate::error::StoreError;

/// CRUD and queries over NPC records.
pub trait NpcStore: Send + Sync {
    /// Persist a new NPC. Fails with `Conflict` on a duplicate id.
    fn create(&self, npc: &Npc) -> Result<(), StoreError>;
    /// Fetch an NPC by id.
    fn get(&self, id: &NpcId) -> Result<Npc, StoreError>;
    /// Replace the stored record for this NPC.
    fn update(&self, npc: &Npc) -> Result<(), StoreError>;
    /// Delete an NPC by id.
    fn delete(&self, id: &NpcId) -> Result<(), StoreError>;
    /// All NPCs owned by the given player.
    fn list_by_player(&self, player_id: &PlayerId) -> Result<Vec<Npc>, StoreError>;
    /// All NPCs that are alive. Used by the kernel's registration pass.
    fn list_active(&self) -> Result<Vec<Npc>, StoreError>;
}

/// CRUD and queries over places.
pub trait PlaceStore: Send + Sync {
    /// Persist a new place.
    fn create(&self, place: &Place) -> Result<(), StoreError>;
    /// Fetch a place by id.
    fn get(&self, id: &PlaceId) -> Result<Place, StoreError>;
    /// Replace the stored record for this place.
    fn update(&self, place: &Place) -> Result<(), StoreError>;
    /// Delete a place by id.
    fn delete(&self, id: &PlaceId) -> Result<(), StoreError>;
}

/// Read access to the static item catalog.
pub trait ItemStore: Send + Sync {
    /// Persist a new catalog item.
    fn create(&self, item: &Item) -> Result<(), StoreError>;
    /// Fetch an item by id.
    fn get(&self, id: &ItemId) -> Result<Item, StoreError>;
    /// Delete an item by id.
    fn delete(&self, id: &ItemId) -> Result<(), StoreError>;
}

/// Read access to the static effect catalog.
pub trait EffectStore: Send + Sync {
    /// Persist a new effect.
    fn create(&self, effect: &Effect) -> Result<(), StoreError>;
    /// Fetch an effect by id.
    fn get(&self, id: &EffectId) -> Result<Effect, StoreError>;
    /// Delete an effect by id.
    fn delete(&self, id: &EffectId) -> Result<(), StoreError>;
}

/// The town's road graph.
pub trait RoadStore: Send + Sync {
    /// Persist a new road.
    fn create(&self, road: &Road) -> Result<(), StoreError>;
    /// Fetch a road by id.
    fn get(&self, id: &RoadId) -> Result<Road, StoreError>;
    /// Delete a road by id.
    fn delete(&self, id: &RoadId) -> Result<(), StoreError>;
    /// All roads touching the given place, in stable order.
    fn list_nearby(&self, place_id: &PlaceId) -> Result<Vec<Road>, StoreError>;
}

/// Append-only NPC memory log.
pub trait MemoryStore: Send + Sync {
    /// Append a memory entry; the store assigns the id.
    fn append(&self, entry: &MemoryEntry) -> Result<i64, StoreError>;
    /// All memory entries for an NPC, oldest first.
    fn list_by_npc(&self, npc_id: &NpcId) -> Result<Vec<MemoryEntry>, StoreError>;
    /// Admin-only deletion of a single entry.
    fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Durable event log backing the bus.
pub trait EventStore: Send + Sync {
    /// Persist a published event; the store assigns the durable id.
    fn append(&self, event: &Event) -> Result<EventId, StoreError>;
    /// Durably mark an event processed with its resolution timestamp.
    fn mark_processed(&self, id: EventId, processed_at: DateTime<Utc>) -> Result<(), StoreError>;
    /// Events not yet marked processed, oldest first, up to `limit`.
    fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<Event>, StoreError>;
}

/// Town records and the recorded sim start time.
pub trait TownStore: Send + Sync {
    /// Persist a new town.
    fn create(&self, town: &Town) -> Result<(), StoreError>;
    /// Fetch a town by id.
    fn get(&self, id: &TownId) -> Result<Town, StoreError>;
    /// Record the wall-clock instant the simulation clock started.
    fn set_sim_start_time(&self, id: &TownId, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// The recorded sim start time, if the clock has ever started.
    fn get_sim_start_time(&self, id: &TownId) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Player records.
pub trait PlayerStore: Send + Sync {
    /// Persist a new player.
    fn create(&self, player: &Player) -> Result<(), StoreError>;
    /// Fetch a player by id.
    fn get(&self, id: &PlayerId) -> Result<Player, StoreError>;
    /// Delete a player by id.
    fn delete(&self, id: &PlayerId) -> Result<(), StoreError>;
}

/// The bundle of store handles the kernel is constructed with.
#[derive(Clone)]
pub struct Stores {
    /// NPC records.
    pub npcs: Arc<dyn NpcStore>,
    /// Places.
    pub places: Arc<dyn PlaceStore>,
    /// Item catalog.
    pub items: Arc<dyn ItemStore>,
    /// Effect catalog.
    pub effects: Arc<dyn EffectStore>,
    /// Road graph.
    pub roads: Arc<dyn RoadStore>,
    /// Memory log.
    pub memories: Arc<dyn MemoryStore>,
    /// Event log.
    pub events: Arc<dyn EventStore>,
    /// Towns.
    pub towns: Arc<dyn TownStore>,
    /// Players.
    pub players: Arc<dyn PlayerStore>,
}

impl Stores {
    /// Build a bundle where every handle points at the same
    /// [`crate::InMemoryStore`].
    pub fn from_memory(store: &Arc<crate::InMemoryStore>) -> Self {
        Self {
            npcs: Arc::clone(store) as Arc<dyn NpcStore>,
            places: Arc::clone(store) as Arc<dyn PlaceStore>,
            items: Arc::clone(store) as Arc<dyn ItemStore>,
            effects: Arc::clone(store) as Arc<dyn EffectStore>,
            roads: Arc::clone(store) as Arc<dyn RoadStore>,
            memories: Arc::clone(store) as Arc<dyn MemoryStore>,
            events: Arc::clone(store) as Arc<dyn EventStore>,
            towns: Arc::clone(store) as Arc<dyn TownStore>,
            players: Arc::clone(store) as Arc<dyn PlayerStore>,
        }
    }
}
