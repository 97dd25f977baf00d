//! In-memory store used by tests and local wiring.
//!
//! Rows are held as encoded text keyed by id, so every read and write
//! round-trips through the [`crate::codec`] boundary exactly as a
//! relational backend with text columns would. One `InMemoryStore`
//! implements every store trait; [`crate::Stores::from_memory`] fans a
//! shared handle out into the per-trait slots.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use townlet_types::{
    Effect, EffectId, Event, EventId, Item, ItemId, MemoryEntry, Npc, NpcId, Place, PlaceId,
    Player, PlayerId, Road, RoadId, Town, TownId,
};
use tracing::debug;

use crate::codec::{decode_row, encode_row};
use crate::error::StoreError;
use crate::stores::{
    EffectStore, EventStore, ItemStore, MemoryStore, NpcStore, PlaceStore, PlayerStore, RoadStore,
    TownStore,
};

/// A table of rows keyed by entity id, values in encoded text form.
type Table = Mutex<BTreeMap<String, String>>;

/// A table with store-assigned integer ids.
#[derive(Debug, Default)]
struct SeqTable {
    /// Next id to assign.
    next_id: i64,
    /// Rows keyed by assigned id, values in encoded text form.
    rows: BTreeMap<i64, String>,
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    npcs: Table,
    places: Table,
    items: Table,
    effects: Table,
    roads: Table,
    towns: Table,
    players: Table,
    memories: Mutex<SeqTable>,
    events: Mutex<SeqTable>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lock a table, recovering the guard if a test thread panicked mid-write.
fn lock<T>(table: &Mutex<T>) -> MutexGuard<'_, T> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Insert an encoded row, failing with `Conflict` on a duplicate id.
fn insert_row<T: serde::Serialize>(
    table: &Table,
    entity: &'static str,
    id: &str,
    row: &T,
) -> Result<(), StoreError> {
    let text = encode_row(row)?;
    let mut rows = lock(table);
    if rows.contains_key(id) {
        return Err(StoreError::conflict(entity, id));
    }
    rows.insert(id.to_owned(), text);
    debug!(entity, id, "row created");
    Ok(())
}

/// Fetch and decode a row by id.
fn get_row<T: serde::de::DeserializeOwned>(
    table: &Table,
    entity: &'static str,
    id: &str,
) -> Result<T, StoreError> {
    let rows = lock(table);
    let text = rows
        .get(id)
        .ok_or_else(|| StoreError::not_found(entity, id))?;
    decode_row(text)
}

/// Replace an existing row, failing with `NotFound` if it never existed.
fn replace_row<T: serde::Serialize>(
    table: &Table,
    entity: &'static str,
    id: &str,
    row: &T,
) -> Result<(), StoreError> {
    let text = encode_row(row)?;
    let mut rows = lock(table);
    if !rows.contains_key(id) {
        return Err(StoreError::not_found(entity, id));
    }
    rows.insert(id.to_owned(), text);
    debug!(entity, id, "row replaced");
    Ok(())
}

/// Delete a row by id.
fn delete_row(table: &Table, entity: &'static str, id: &str) -> Result<(), StoreError> {
    let mut rows = lock(table);
    rows.remove(id)
        .map(|_| debug!(entity, id, "row deleted"))
        .ok_or_else(|| StoreError::not_found(entity, id))
}

/// Decode every row in a table.
fn all_rows<T: serde::de::DeserializeOwned>(table: &Table) -> Result<Vec<T>, StoreError> {
    lock(table).values().map(|text| decode_row(text)).collect()
}

impl NpcStore for InMemoryStore {
    fn create(&self, npc: &Npc) -> Result<(), StoreError> {
        insert_row(&self.npcs, "npc", npc.id.as_str(), npc)
    }

    fn get(&self, id: &NpcId) -> Result<Npc, StoreError> {
        get_row(&self.npcs, "npc", id.as_str())
    }

    fn update(&self, npc: &Npc) -> Result<(), StoreError> {
        replace_row(&self.npcs, "npc", npc.id.as_str(), npc)
    }

    fn delete(&self, id: &NpcId) -> Result<(), StoreError> {
        delete_row(&self.npcs, "npc", id.as_str())
    }

    fn list_by_player(&self, player_id: &PlayerId) -> Result<Vec<Npc>, StoreError> {
        let npcs: Vec<Npc> = all_rows(&self.npcs)?;
        Ok(npcs
            .into_iter()
            .filter(|npc| npc.player_id.as_ref() == Some(player_id))
            .collect())
    }

    fn list_active(&self) -> Result<Vec<Npc>, StoreError> {
        let npcs: Vec<Npc> = all_rows(&self.npcs)?;
        Ok(npcs.into_iter().filter(|npc| !npc.is_dead).collect())
    }
}

impl PlaceStore for InMemoryStore {
    fn create(&self, place: &Place) -> Result<(), StoreError> {
        insert_row(&self.places, "place", place.id.as_str(), place)
    }

    fn get(&self, id: &PlaceId) -> Result<Place, StoreError> {
        get_row(&self.places, "place", id.as_str())
    }

    fn update(&self, place: &Place) -> Result<(), StoreError> {
        replace_row(&self.places, "place", place.id.as_str(), place)
    }

    fn delete(&self, id: &PlaceId) -> Result<(), StoreError> {
        delete_row(&self.places, "place", id.as_str())
    }
}

impl ItemStore for InMemoryStore {
    fn create(&self, item: &Item) -> Result<(), StoreError> {
        insert_row(&self.items, "item", item.id.as_str(), item)
    }

    fn get(&self, id: &ItemId) -> Result<Item, StoreError> {
        get_row(&self.items, "item", id.as_str())
    }

    fn delete(&self, id: &ItemId) -> Result<(), StoreError> {
        delete_row(&self.items, "item", id.as_str())
    }
}

impl EffectStore for InMemoryStore {
    fn create(&self, effect: &Effect) -> Result<(), StoreError> {
        insert_row(&self.effects, "effect", effect.id.as_str(), effect)
    }

    fn get(&self, id: &EffectId) -> Result<Effect, StoreError> {
        get_row(&self.effects, "effect", id.as_str())
    }

    fn delete(&self, id: &EffectId) -> Result<(), StoreError> {
        delete_row(&self.effects, "effect", id.as_str())
    }
}

impl RoadStore for InMemoryStore {
    fn create(&self, road: &Road) -> Result<(), StoreError> {
        insert_row(&self.roads, "road", road.id.as_str(), road)
    }

    fn get(&self, id: &RoadId) -> Result<Road, StoreError> {
        get_row(&self.roads, "road", id.as_str())
    }

    fn delete(&self, id: &RoadId) -> Result<(), StoreError> {
        delete_row(&self.roads, "road", id.as_str())
    }

    fn list_nearby(&self, place_id: &PlaceId) -> Result<Vec<Road>, StoreError> {
        let roads: Vec<Road> = all_rows(&self.roads)?;
        Ok(roads
            .into_iter()
            .filter(|road| road.touches(place_id))
            .collect())
    }
}

impl MemoryStore for InMemoryStore {
    fn append(&self, entry: &MemoryEntry) -> Result<i64, StoreError> {
        let mut stored = entry.clone();
        let mut table = lock(&self.memories);
        let id = table.next_id;
        stored.id = Some(id);
        let text = encode_row(&stored)?;
        table.next_id = id.saturating_add(1);
        table.rows.insert(id, text);
        Ok(id)
    }

    fn list_by_npc(&self, npc_id: &NpcId) -> Result<Vec<MemoryEntry>, StoreError> {
        let table = lock(&self.memories);
        let mut entries = Vec::new();
        for text in table.rows.values() {
            let entry: MemoryEntry = decode_row(text)?;
            if entry.npc_id == *npc_id {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut table = lock(&self.memories);
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("memory", id.to_string()))
    }
}

impl EventStore for InMemoryStore {
    fn append(&self, event: &Event) -> Result<EventId, StoreError> {
        let mut stored = event.clone();
        let mut table = lock(&self.events);
        let id = EventId(table.next_id);
        stored.id = Some(id);
        let text = encode_row(&stored)?;
        table.next_id = table.next_id.saturating_add(1);
        table.rows.insert(id.into_inner(), text);
        debug!(event_id = %id, "event appended");
        Ok(id)
    }

    fn mark_processed(&self, id: EventId, processed_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut table = lock(&self.events);
        let text = table
            .rows
            .get(&id.into_inner())
            .ok_or_else(|| StoreError::not_found("event", id.to_string()))?;
        let mut event: Event = decode_row(text)?;
        event.mark_processed(processed_at);
        let updated = encode_row(&event)?;
        table.rows.insert(id.into_inner(), updated);
        Ok(())
    }

    fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<Event>, StoreError> {
        let table = lock(&self.events);
        let mut events = Vec::new();
        for text in table.rows.values() {
            if events.len() >= limit {
                break;
            }
            let event: Event = decode_row(text)?;
            if !event.processed {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl TownStore for InMemoryStore {
    fn create(&self, town: &Town) -> Result<(), StoreError> {
        insert_row(&self.towns, "town", town.id.as_str(), town)
    }

    fn get(&self, id: &TownId) -> Result<Town, StoreError> {
        get_row(&self.towns, "town", id.as_str())
    }

    fn set_sim_start_time(&self, id: &TownId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut town: Town = get_row(&self.towns, "town", id.as_str())?;
        town.sim_start_time = Some(at);
        replace_row(&self.towns, "town", id.as_str(), &town)
    }

    fn get_sim_start_time(&self, id: &TownId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let town: Town = get_row(&self.towns, "town", id.as_str())?;
        Ok(town.sim_start_time)
    }
}

impl PlayerStore for InMemoryStore {
    fn create(&self, player: &Player) -> Result<(), StoreError> {
        insert_row(&self.players, "player", player.id.as_str(), player)
    }

    fn get(&self, id: &PlayerId) -> Result<Player, StoreError> {
        get_row(&self.players, "player", id.as_str())
    }

    fn delete(&self, id: &PlayerId) -> Result<(), StoreError> {
        delete_row(&self.players, "player", id.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use townlet_types::Action;

    use super::*;

    #[test]
    fn create_get_update_delete_npc() {
        let store = InMemoryStore::new();
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        NpcStore::create(&store, &npc).unwrap();

        let loaded = NpcStore::get(&store, &npc.id).unwrap();
        assert_eq!(loaded, npc);

        npc.energy = 40;
        NpcStore::update(&store, &npc).unwrap();
        assert_eq!(NpcStore::get(&store, &npc.id).unwrap().energy, 40);

        NpcStore::delete(&store, &npc.id).unwrap();
        assert!(matches!(
            NpcStore::get(&store, &npc.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_create_is_a_conflict() {
        let store = InMemoryStore::new();
        let npc = Npc::new("Ada", PlaceId::from("place:home"));
        NpcStore::create(&store, &npc).unwrap();
        assert!(matches!(
            NpcStore::create(&store, &npc),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn update_of_missing_row_is_not_found() {
        let store = InMemoryStore::new();
        let npc = Npc::new("Ada", PlaceId::from("place:home"));
        assert!(matches!(
            NpcStore::update(&store, &npc),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn list_active_skips_dead_npcs() {
        let store = InMemoryStore::new();
        let alive = Npc::new("Ada", PlaceId::from("place:home"));
        let mut dead = Npc::new("Ghost", PlaceId::from("place:home"));
        dead.is_dead = true;
        NpcStore::create(&store, &alive).unwrap();
        NpcStore::create(&store, &dead).unwrap();

        let active = store.list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|n| n.id.clone()), Some(alive.id));
    }

    #[test]
    fn roads_nearby_touch_the_place() {
        let store = InMemoryStore::new();
        let home = PlaceId::from("place:home");
        let work = PlaceId::from("place:work");
        let tavern = PlaceId::from("place:tavern");
        RoadStore::create(
            &store,
            &Road {
                id: RoadId::from("road:a"),
                from_place: home.clone(),
                to_place: work.clone(),
                direction: String::from("east"),
            },
        )
        .unwrap();
        RoadStore::create(
            &store,
            &Road {
                id: RoadId::from("road:b"),
                from_place: work.clone(),
                to_place: tavern,
                direction: String::from("north"),
            },
        )
        .unwrap();

        assert_eq!(store.list_nearby(&home).unwrap().len(), 1);
        assert_eq!(store.list_nearby(&work).unwrap().len(), 2);
    }

    #[test]
    fn event_append_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let a = EventStore::append(&store, &Event::action(Action::idle(NpcId::from("npc:a"))))
            .unwrap();
        let b = EventStore::append(&store, &Event::action(Action::idle(NpcId::from("npc:b"))))
            .unwrap();
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn mark_processed_removes_from_unprocessed() {
        let store = InMemoryStore::new();
        let id = EventStore::append(&store, &Event::action(Action::idle(NpcId::from("npc:a"))))
            .unwrap();
        assert_eq!(store.fetch_unprocessed(10).unwrap().len(), 1);

        store.mark_processed(id, Utc::now()).unwrap();
        assert!(store.fetch_unprocessed(10).unwrap().is_empty());
    }

    #[test]
    fn memory_log_is_append_only_per_npc() {
        let store = InMemoryStore::new();
        let npc_id = NpcId::from("npc:ada");
        MemoryStore::append(&store, &MemoryEntry::new(npc_id.clone(), "woke up")).unwrap();
        MemoryStore::append(&store, &MemoryEntry::new(npc_id.clone(), "ate bread")).unwrap();
        MemoryStore::append(&store, &MemoryEntry::new(NpcId::from("npc:bob"), "slept")).unwrap();

        let entries = store.list_by_npc(&npc_id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.first().map(|e| e.content.clone()), Some(String::from("woke up")));
    }

    #[test]
    fn sim_start_time_round_trips() {
        let store = InMemoryStore::new();
        let town = Town {
            id: TownId::from("town:001"),
            name: String::from("Townlet"),
            description: String::new(),
            sim_start_time: None,
        };
        TownStore::create(&store, &town).unwrap();
        assert_eq!(store.get_sim_start_time(&town.id).unwrap(), None);

        let at = Utc::now();
        store.set_sim_start_time(&town.id, at).unwrap();
        assert_eq!(store.get_sim_start_time(&town.id).unwrap(), Some(at));
    }
}
