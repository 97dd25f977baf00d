//! The action executor: resolving action intents against world state.
//!
//! Each intent runs `validate -> apply -> remember -> resolve`. Domain
//! rejection (no road, not enough coins) is a boolean outcome, not an
//! error; rejected intents fall back to `idle`, which always succeeds
//! and always records one memory entry, so every tick makes forward
//! progress. Hard failures (missing NPC/item/place) are store errors
//! and propagate. The originating event is marked processed exactly
//! once regardless of which branch ran.

use std::sync::Arc;

use chrono::Utc;
use townlet_economy::{apply_effect, deduct_low_first, merge_coins, split_amount, total_value};
use townlet_oracle::{DecisionOracle, PromptEngine};
use townlet_store::stores::Stores;
use townlet_store::StoreError;
use townlet_types::{
    Action, Event, EventPayload, ItemId, ItemType, MemoryEntry, Npc, NpcId, NpcStatus, PlaceId,
    PlaceTag,
};
use tracing::{debug, info, warn};

use crate::bus::{BusContext, Subscriber};
use crate::config::WritePolicy;
use crate::error::KernelError;

/// Hourly rates for sleep, work, and idle.
const SLEEP_ENERGY_PER_HOUR: u32 = 10;
const SLEEP_MOOD_PER_HOUR: u32 = 5;
const WORK_ENERGY_PER_HOUR: u32 = 10;
const WORK_MOOD_PER_HOUR: u32 = 5;
const WORK_PAY_PER_HOUR: u64 = 20;
const IDLE_MOOD_GAIN: u32 = 10;
const IDLE_ENERGY_COST: u32 = 5;

/// Resolves action intents delivered by the bus.
pub struct ActionExecutor {
    stores: Stores,
    oracle: Arc<dyn DecisionOracle>,
    prompts: Arc<PromptEngine>,
    write_policy: WritePolicy,
    max_long_memory_chars: usize,
}

impl ActionExecutor {
    /// Construct an executor over the injected store bundle.
    pub const fn new(
        stores: Stores,
        oracle: Arc<dyn DecisionOracle>,
        prompts: Arc<PromptEngine>,
        write_policy: WritePolicy,
        max_long_memory_chars: usize,
    ) -> Self {
        Self {
            stores,
            oracle,
            prompts,
            write_policy,
            max_long_memory_chars,
        }
    }

    /// Resolve one action intent. Returns whether the action itself
    /// succeeded; rejected intents have already fallen back to `idle`
    /// by the time this returns.
    pub fn execute(&self, action: &Action) -> Result<bool, KernelError> {
        let applied = self.dispatch(action)?;
        if !applied {
            debug!(npc_id = %action.npc_id(), kind = action.kind(), "action rejected, falling back to idle");
            self.idle(action.npc_id())?;
        }
        Ok(applied)
    }

    fn dispatch(&self, action: &Action) -> Result<bool, KernelError> {
        match action {
            Action::Move { npc_id, place_id } => self.move_npc(npc_id, place_id),
            Action::Eat {
                npc_id,
                item_id,
                item_amount,
            } => self.eat(npc_id, item_id, *item_amount),
            Action::Sleep {
                npc_id,
                duration_hours,
            } => self.sleep(npc_id, *duration_hours),
            Action::Work {
                npc_id,
                duration_hours,
            } => self.work(npc_id, *duration_hours),
            Action::Buy {
                npc_id,
                item_id,
                item_amount,
            } => self.buy(npc_id, item_id, *item_amount),
            Action::Sell {
                npc_id,
                item_id,
                item_amount,
            } => self.sell(npc_id, item_id, *item_amount),
            Action::Idle { npc_id } => self.idle(npc_id),
        }
    }

    /// Move to an adjacent place. Rejected when no road connects the
    /// NPC's location to the destination.
    fn move_npc(&self, npc_id: &NpcId, place_id: &PlaceId) -> Result<bool, KernelError> {
        let mut npc = self.stores.npcs.get(npc_id)?;
        let from = self.stores.places.get(&npc.location_id)?;
        let to = self.stores.places.get(place_id)?;

        let roads = self.stores.roads.list_nearby(&npc.location_id)?;
        if !roads.iter().any(|road| road.connects(&npc.location_id, place_id)) {
            debug!(npc_id = %npc_id, from = %from.name, to = %to.name, "no connecting road");
            return Ok(false);
        }

        npc.location_id = place_id.clone();
        let msg = format!("{} moved from {} to {}", npc.name, from.name, to.name);
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Consume an item from inventory and apply its effects, scaled by
    /// quantity. Rejected on a zero quantity, insufficient stock, or a
    /// non-consumable.
    fn eat(&self, npc_id: &NpcId, item_id: &ItemId, amount: u32) -> Result<bool, KernelError> {
        if amount == 0 {
            debug!(npc_id = %npc_id, item_id = %item_id, "cannot eat a zero quantity");
            return Ok(false);
        }
        let mut npc = self.stores.npcs.get(npc_id)?;
        let item = self.stores.items.get(item_id)?;

        let held = npc.inventory.get(item_id).copied().unwrap_or(0);
        if held < amount || item.item_type != ItemType::Consumable {
            debug!(npc_id = %npc_id, item = %item.name, held, wanted = amount, "cannot eat");
            return Ok(false);
        }

        for effect_id in &item.effect_ids {
            let effect = self.stores.effects.get(effect_id)?;
            apply_effect(&mut npc, &effect, i64::from(amount));
        }
        remove_from_inventory(&mut npc, item_id, amount);

        let msg = format!("{} ate {} x{amount}", npc.name, item.name);
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Sleep for some hours. Always succeeds; a HOUSE place grants a
    /// 1.2x recovery bonus (exact in integers for the hourly rates).
    fn sleep(&self, npc_id: &NpcId, hours: u32) -> Result<bool, KernelError> {
        let mut npc = self.stores.npcs.get(npc_id)?;
        let place = self.stores.places.get(&npc.location_id)?;

        let mut energy_gain = SLEEP_ENERGY_PER_HOUR.saturating_mul(hours);
        let mut mood_gain = SLEEP_MOOD_PER_HOUR.saturating_mul(hours);
        let msg = if place.has_tag(PlaceTag::House) {
            energy_gain = scale_six_fifths(energy_gain);
            mood_gain = scale_six_fifths(mood_gain);
            format!("{} slept soundly at {}", npc.name, place.name)
        } else {
            format!("{} slept at {}", npc.name, place.name)
        };

        npc.energy = raise_stat(npc.energy, energy_gain);
        npc.mood = raise_stat(npc.mood, mood_gain);
        npc.status = NpcStatus::Sleeping;

        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Work a shift. Requires a WORKABLE place and enough energy and
    /// mood to last the whole shift; pays 20 base units per hour,
    /// decomposed into coins.
    fn work(&self, npc_id: &NpcId, hours: u32) -> Result<bool, KernelError> {
        let mut npc = self.stores.npcs.get(npc_id)?;
        let place = self.stores.places.get(&npc.location_id)?;

        let energy_cost = WORK_ENERGY_PER_HOUR.saturating_mul(hours);
        let mood_cost = WORK_MOOD_PER_HOUR.saturating_mul(hours);

        if !place.has_tag(PlaceTag::Workable) {
            debug!(npc_id = %npc_id, place = %place.name, "place is not workable");
            return Ok(false);
        }
        if u32::from(npc.energy) < energy_cost || u32::from(npc.mood) < mood_cost {
            debug!(npc_id = %npc_id, energy = npc.energy, mood = npc.mood, "not enough energy or mood to work");
            return Ok(false);
        }

        let pay = WORK_PAY_PER_HOUR.saturating_mul(u64::from(hours));
        merge_coins(&mut npc.inventory, &split_amount(pay));
        npc.energy = lower_stat(npc.energy, energy_cost);
        npc.mood = lower_stat(npc.mood, mood_cost);

        let msg = format!(
            "{} worked at {} for {hours} hours and earned {pay} coins",
            npc.name, place.name
        );
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Buy from the current place's shop stock. Requires a positive
    /// quantity, stock, and enough total coin value; payment spends
    /// small coins first. Inventory counts stay strictly positive: a
    /// zero-quantity intent is rejected before it can insert a
    /// zero-count key.
    fn buy(&self, npc_id: &NpcId, item_id: &ItemId, amount: u32) -> Result<bool, KernelError> {
        if amount == 0 {
            debug!(npc_id = %npc_id, item_id = %item_id, "cannot buy a zero quantity");
            return Ok(false);
        }
        let mut npc = self.stores.npcs.get(npc_id)?;
        let item = self.stores.items.get(item_id)?;
        let place = self.stores.places.get(&npc.location_id)?;

        let stocked = place.shop_inventory.get(item_id).copied().unwrap_or(0);
        if stocked < amount {
            debug!(npc_id = %npc_id, item = %item.name, stocked, wanted = amount, "not enough shop stock");
            return Ok(false);
        }

        let cost = item.value.saturating_mul(u64::from(amount));
        if total_value(&npc.inventory) < cost {
            debug!(npc_id = %npc_id, item = %item.name, cost, "not enough coins");
            return Ok(false);
        }

        let (deducted, ok) = deduct_low_first(&npc.inventory, cost);
        if !ok {
            // Covered in total value but not payable exactly low-first.
            debug!(npc_id = %npc_id, cost, "coin deduction failed despite sufficient total value");
            return Ok(false);
        }
        npc.inventory = deducted;
        let slot = npc.inventory.entry(item_id.clone()).or_insert(0);
        *slot = slot.saturating_add(amount);

        let msg = format!("{} bought {} x{amount} at {}", npc.name, item.name, place.name);
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Sell from inventory at a SHOP place. Requires a positive
    /// quantity; pays item value per unit, decomposed into coins the
    /// same way work wages are.
    fn sell(&self, npc_id: &NpcId, item_id: &ItemId, amount: u32) -> Result<bool, KernelError> {
        if amount == 0 {
            debug!(npc_id = %npc_id, item_id = %item_id, "cannot sell a zero quantity");
            return Ok(false);
        }
        let mut npc = self.stores.npcs.get(npc_id)?;
        let item = self.stores.items.get(item_id)?;
        let place = self.stores.places.get(&npc.location_id)?;

        if !place.has_tag(PlaceTag::Shop) {
            debug!(npc_id = %npc_id, place = %place.name, "place is not a shop");
            return Ok(false);
        }
        let held = npc.inventory.get(item_id).copied().unwrap_or(0);
        if held < amount {
            debug!(npc_id = %npc_id, item = %item.name, held, wanted = amount, "not enough stock to sell");
            return Ok(false);
        }

        let earnings = item.value.saturating_mul(u64::from(amount));
        merge_coins(&mut npc.inventory, &split_amount(earnings));
        remove_from_inventory(&mut npc, item_id, amount);

        let msg = format!(
            "{} sold {} x{amount} at {} for {earnings}",
            npc.name, item.name, place.name
        );
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Idle: small mood gain, small energy cost. Never fails, which is
    /// what makes it a safe fallback for every rejection.
    fn idle(&self, npc_id: &NpcId) -> Result<bool, KernelError> {
        let mut npc = self.stores.npcs.get(npc_id)?;
        let place = self.stores.places.get(&npc.location_id)?;

        npc.mood = raise_stat(npc.mood, IDLE_MOOD_GAIN);
        npc.energy = lower_stat(npc.energy, IDLE_ENERGY_COST);

        let msg = format!("{} relaxed at {} and felt a little better", npc.name, place.name);
        self.remember(&mut npc, &msg)?;
        self.persist_npc(&npc)?;
        Ok(true)
    }

    /// Append a memory entry and extend the NPC's long memory. When the
    /// long memory exceeds its cap, ask the oracle for a summary; a
    /// failed summarization keeps the unsummarized text.
    fn remember(&self, npc: &mut Npc, content: &str) -> Result<(), KernelError> {
        let entry = MemoryEntry::new(npc.id.clone(), content);
        self.apply_write(
            self.stores.memories.append(&entry).map(|_| ()),
            "memory append",
        )?;

        if !npc.long_memory.is_empty() {
            npc.long_memory.push('\n');
        }
        npc.long_memory.push_str(content);

        if npc.long_memory.chars().count() > self.max_long_memory_chars {
            self.summarize_long_memory(npc);
        }
        Ok(())
    }

    /// Replace the long memory with an oracle-generated summary.
    /// Oracle failure is absorbed: summarization is best effort.
    fn summarize_long_memory(&self, npc: &mut Npc) {
        let prompt = match self.prompts.render_summary(&npc.long_memory) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(npc_id = %npc.id, error = %e, "summary prompt render failed");
                return;
            }
        };
        match self.oracle.generate(&prompt) {
            Ok(summary) if !summary.trim().is_empty() => {
                info!(npc_id = %npc.id, "long memory summarized");
                npc.long_memory = summary;
            }
            Ok(_) => warn!(npc_id = %npc.id, "oracle returned empty summary, keeping long memory"),
            Err(e) => warn!(npc_id = %npc.id, error = %e, "memory summarization failed"),
        }
    }

    /// Write the NPC's whole record back, stamping `updated_at`.
    fn persist_npc(&self, npc: &Npc) -> Result<(), KernelError> {
        let mut updated = npc.clone();
        updated.updated_at = Some(Utc::now());
        self.apply_write(self.stores.npcs.update(&updated), "npc update")
    }

    /// Apply the configured write policy to a store write result.
    fn apply_write(
        &self,
        result: Result<(), StoreError>,
        what: &'static str,
    ) -> Result<(), KernelError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => match self.write_policy {
                WritePolicy::Strict => Err(KernelError::Store(e)),
                WritePolicy::BestEffort => {
                    warn!(error = %e, "{what} failed, continuing (best-effort writes)");
                    Ok(())
                }
            },
        }
    }
}

impl Subscriber for ActionExecutor {
    /// Resolve a delivered action event and mark it processed.
    fn handle(&mut self, event: &mut Event, _ctx: &mut BusContext<'_>) -> Result<(), KernelError> {
        if event.processed {
            return Ok(());
        }
        let EventPayload::Action { intent } = &event.payload else {
            return Ok(());
        };
        let intent = intent.clone();
        let result = self.execute(&intent);
        event.mark_processed(Utc::now());
        result.map(|_| ())
    }
}

/// Decrement an inventory slot, removing the key when it reaches zero.
fn remove_from_inventory(npc: &mut Npc, item_id: &ItemId, amount: u32) {
    let held = npc.inventory.get(item_id).copied().unwrap_or(0);
    let left = held.saturating_sub(amount);
    if left == 0 {
        npc.inventory.remove(item_id);
    } else {
        npc.inventory.insert(item_id.clone(), left);
    }
}

/// Raise a stat, capped at 100.
fn raise_stat(stat: u8, gain: u32) -> u8 {
    u8::try_from(u32::from(stat).saturating_add(gain).min(100)).unwrap_or(100)
}

/// Lower a stat, floored at 0.
fn lower_stat(stat: u8, cost: u32) -> u8 {
    u8::try_from(u32::from(stat).saturating_sub(cost)).unwrap_or(0)
}

/// Multiply by 1.2, exact in integers for multiples of 5.
const fn scale_six_fifths(value: u32) -> u32 {
    value.saturating_mul(6) / 5
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use townlet_oracle::ScriptedOracle;
    use townlet_store::InMemoryStore;
    use townlet_types::{Effect, EffectAttribute, EffectId, Item, Place, Road, RoadId};

    use super::*;

    struct Fixture {
        stores: Stores,
        executor: ActionExecutor,
        npc_id: NpcId,
    }

    fn coins(entries: &[(&str, u32)]) -> BTreeMap<ItemId, u32> {
        entries
            .iter()
            .map(|(id, count)| (ItemId::from(*id), *count))
            .collect()
    }

    /// World with home (HOUSE), work (WORKABLE), market (SHOP), roads
    /// home<->work and home<->market, and one NPC at home.
    fn fixture(policy: WritePolicy) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let stores = Stores::from_memory(&store);

        let mut home = Place::new(PlaceId::from("place:home"), "Home");
        home.tags.insert(PlaceTag::House);
        let mut work = Place::new(PlaceId::from("place:work"), "Workshop");
        work.tags.insert(PlaceTag::Workable);
        let mut market = Place::new(PlaceId::from("place:market"), "Market");
        market.tags.insert(PlaceTag::Shop);
        market
            .shop_inventory
            .insert(ItemId::from("item:elixir"), 1);
        for place in [&home, &work, &market] {
            stores.places.create(place).unwrap();
        }

        stores
            .roads
            .create(&Road {
                id: RoadId::from("road:home-work"),
                from_place: PlaceId::from("place:home"),
                to_place: PlaceId::from("place:work"),
                direction: String::from("east"),
            })
            .unwrap();
        stores
            .roads
            .create(&Road {
                id: RoadId::from("road:home-market"),
                from_place: PlaceId::from("place:home"),
                to_place: PlaceId::from("place:market"),
                direction: String::from("west"),
            })
            .unwrap();

        stores
            .effects
            .create(&Effect {
                id: EffectId::from("effect:satiety"),
                name: String::from("satiety"),
                attribute: EffectAttribute::Hunger,
                change: 20,
            })
            .unwrap();
        stores
            .items
            .create(&Item {
                id: ItemId::from("item:bread"),
                name: String::from("bread"),
                value: 10,
                item_type: ItemType::Consumable,
                effect_ids: vec![EffectId::from("effect:satiety")],
                description: String::from("a loaf"),
            })
            .unwrap();
        stores
            .items
            .create(&Item {
                id: ItemId::from("item:elixir"),
                name: String::from("elixir"),
                value: 50,
                item_type: ItemType::Consumable,
                effect_ids: Vec::new(),
                description: String::from("a potion"),
            })
            .unwrap();

        let npc = Npc::new("Ada", PlaceId::from("place:home"));
        let npc_id = npc.id.clone();
        stores.npcs.create(&npc).unwrap();

        let executor = ActionExecutor::new(
            stores.clone(),
            Arc::new(ScriptedOracle::default()),
            Arc::new(PromptEngine::new().unwrap()),
            policy,
            8400,
        );
        Fixture {
            stores,
            executor,
            npc_id,
        }
    }

    fn npc_of(f: &Fixture) -> Npc {
        f.stores.npcs.get(&f.npc_id).unwrap()
    }

    fn set_npc<F: FnOnce(&mut Npc)>(f: &Fixture, mutate: F) {
        let mut npc = npc_of(f);
        mutate(&mut npc);
        f.stores.npcs.update(&npc).unwrap();
    }

    #[test]
    fn move_follows_roads_and_remembers() {
        let f = fixture(WritePolicy::Strict);
        let ok = f
            .executor
            .execute(&Action::Move {
                npc_id: f.npc_id.clone(),
                place_id: PlaceId::from("place:work"),
            })
            .unwrap();
        assert!(ok);

        let npc = npc_of(&f);
        assert_eq!(npc.location_id, PlaceId::from("place:work"));
        assert!(npc.updated_at.is_some());

        let memories = f.stores.memories.list_by_npc(&f.npc_id).unwrap();
        assert_eq!(memories.len(), 1);
        assert!(memories.first().unwrap().content.contains("moved"));
    }

    #[test]
    fn move_without_road_falls_back_to_idle() {
        let f = fixture(WritePolicy::Strict);
        // No road from home leads back to home.
        let ok = f
            .executor
            .execute(&Action::Move {
                npc_id: f.npc_id.clone(),
                place_id: PlaceId::from("place:home"),
            })
            .unwrap();
        assert!(!ok);

        let npc = npc_of(&f);
        assert_eq!(npc.location_id, PlaceId::from("place:home"));
        // The idle fallback ran: one memory entry, mood up, energy down.
        let memories = f.stores.memories.list_by_npc(&f.npc_id).unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(npc.energy, 95);
    }

    #[test]
    fn work_then_pay() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:work");
            npc.energy = 80;
            npc.mood = 70;
        });

        let ok = f
            .executor
            .execute(&Action::Work {
                npc_id: f.npc_id.clone(),
                duration_hours: 2,
            })
            .unwrap();
        assert!(ok);

        let npc = npc_of(&f);
        assert_eq!(npc.energy, 60);
        assert_eq!(npc.mood, 60);
        // 40 base units arrive as 4 silver coins.
        assert_eq!(npc.inventory, coins(&[("item:silver_coin", 4)]));
    }

    #[test]
    fn work_rejected_when_too_tired() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:work");
            npc.energy = 15;
        });

        let ok = f
            .executor
            .execute(&Action::Work {
                npc_id: f.npc_id.clone(),
                duration_hours: 2,
            })
            .unwrap();
        assert!(!ok);
        assert!(npc_of(&f).inventory.is_empty());
    }

    #[test]
    fn sleep_at_house_gets_the_bonus() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.energy = 40;
            npc.mood = 40;
        });

        f.executor
            .execute(&Action::Sleep {
                npc_id: f.npc_id.clone(),
                duration_hours: 2,
            })
            .unwrap();

        let npc = npc_of(&f);
        // 20 energy and 10 mood, scaled by 6/5 for the HOUSE tag.
        assert_eq!(npc.energy, 64);
        assert_eq!(npc.mood, 52);
        assert_eq!(npc.status, NpcStatus::Sleeping);
    }

    #[test]
    fn eat_applies_effects_and_consumes() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.hunger = 30;
            npc.inventory.insert(ItemId::from("item:bread"), 3);
        });

        let ok = f
            .executor
            .execute(&Action::Eat {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 2,
            })
            .unwrap();
        assert!(ok);

        let npc = npc_of(&f);
        assert_eq!(npc.hunger, 70);
        assert_eq!(npc.inventory.get(&ItemId::from("item:bread")), Some(&1));
    }

    #[test]
    fn eat_rejects_more_than_held() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.inventory.insert(ItemId::from("item:bread"), 1);
        });

        let ok = f
            .executor
            .execute(&Action::Eat {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 2,
            })
            .unwrap();
        assert!(!ok);
        assert_eq!(
            npc_of(&f).inventory.get(&ItemId::from("item:bread")),
            Some(&1)
        );
    }

    #[test]
    fn buy_insufficient_stock_leaves_inventory_unchanged() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:market");
            npc.inventory = coins(&[("item:gold_coin", 5)]);
        });

        // Shop stocks a single elixir.
        let ok = f
            .executor
            .execute(&Action::Buy {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:elixir"),
                item_amount: 2,
            })
            .unwrap();
        assert!(!ok);

        let npc = npc_of(&f);
        assert_eq!(npc.inventory.get(&ItemId::from("item:gold_coin")), Some(&5));
        assert!(!npc.inventory.contains_key(&ItemId::from("item:elixir")));
    }

    #[test]
    fn buy_spends_small_coins_first() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:market");
            npc.inventory = coins(&[("item:gold_coin", 1), ("item:silver_coin", 5)]);
        });

        let ok = f
            .executor
            .execute(&Action::Buy {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:elixir"),
                item_amount: 1,
            })
            .unwrap();
        assert!(ok);

        let npc = npc_of(&f);
        // 50 paid as 5 silver; the gold coin survives.
        assert_eq!(npc.inventory.get(&ItemId::from("item:gold_coin")), Some(&1));
        assert!(!npc.inventory.contains_key(&ItemId::from("item:silver_coin")));
        assert_eq!(npc.inventory.get(&ItemId::from("item:elixir")), Some(&1));
    }

    #[test]
    fn buy_zero_quantity_never_creates_a_zero_count_key() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:market");
            npc.inventory = coins(&[("item:gold_coin", 1)]);
        });

        // Zero stock needed, zero cost: without the quantity guard this
        // would pass every precondition and insert elixir x0.
        let ok = f
            .executor
            .execute(&Action::Buy {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:elixir"),
                item_amount: 0,
            })
            .unwrap();
        assert!(!ok);

        let npc = npc_of(&f);
        assert!(!npc.inventory.contains_key(&ItemId::from("item:elixir")));
        assert!(npc.inventory.values().all(|count| *count > 0));
    }

    #[test]
    fn eat_and_sell_reject_zero_quantities() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:market");
            npc.inventory.insert(ItemId::from("item:bread"), 2);
        });

        let eat = f
            .executor
            .execute(&Action::Eat {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 0,
            })
            .unwrap();
        let sell = f
            .executor
            .execute(&Action::Sell {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 0,
            })
            .unwrap();
        assert!(!eat);
        assert!(!sell);
        assert_eq!(
            npc_of(&f).inventory.get(&ItemId::from("item:bread")),
            Some(&2)
        );
    }

    #[test]
    fn sell_pays_canonical_coins() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.location_id = PlaceId::from("place:market");
            npc.inventory.insert(ItemId::from("item:bread"), 4);
        });

        let ok = f
            .executor
            .execute(&Action::Sell {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 4,
            })
            .unwrap();
        assert!(ok);

        let npc = npc_of(&f);
        // 40 earned as 4 silver, the same decomposition work wages use.
        assert_eq!(npc.inventory, coins(&[("item:silver_coin", 4)]));
    }

    #[test]
    fn sell_outside_a_shop_is_rejected() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.inventory.insert(ItemId::from("item:bread"), 1);
        });

        let ok = f
            .executor
            .execute(&Action::Sell {
                npc_id: f.npc_id.clone(),
                item_id: ItemId::from("item:bread"),
                item_amount: 1,
            })
            .unwrap();
        assert!(!ok);
        assert_eq!(
            npc_of(&f).inventory.get(&ItemId::from("item:bread")),
            Some(&1)
        );
    }

    #[test]
    fn idle_adjusts_mood_and_energy() {
        let f = fixture(WritePolicy::Strict);
        set_npc(&f, |npc| {
            npc.mood = 50;
            npc.energy = 50;
        });

        f.executor
            .execute(&Action::Idle {
                npc_id: f.npc_id.clone(),
            })
            .unwrap();

        let npc = npc_of(&f);
        assert_eq!(npc.mood, 60);
        assert_eq!(npc.energy, 45);
    }

    #[test]
    fn strict_policy_propagates_write_failure() {
        let f = fixture(WritePolicy::Strict);
        let err = f
            .executor
            .apply_write(Err(StoreError::not_found("npc", "npc:gone")), "npc update");
        assert!(matches!(err, Err(KernelError::Store(_))));
    }

    #[test]
    fn best_effort_policy_swallows_write_failure() {
        let f = fixture(WritePolicy::BestEffort);
        let result = f
            .executor
            .apply_write(Err(StoreError::not_found("npc", "npc:gone")), "npc update");
        assert!(result.is_ok());
    }

    #[test]
    fn long_memory_is_summarized_past_the_cap() {
        let store = Arc::new(InMemoryStore::new());
        let stores = Stores::from_memory(&store);
        let place = Place::new(PlaceId::from("place:home"), "Home");
        stores.places.create(&place).unwrap();
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        npc.long_memory = "x".repeat(60);
        stores.npcs.create(&npc).unwrap();

        let executor = ActionExecutor::new(
            stores.clone(),
            Arc::new(ScriptedOracle::new(["a tidy summary"])),
            Arc::new(PromptEngine::new().unwrap()),
            WritePolicy::Strict,
            50,
        );
        executor.execute(&Action::idle(npc.id.clone())).unwrap();

        let npc = stores.npcs.get(&npc.id).unwrap();
        assert_eq!(npc.long_memory, "a tidy summary");
    }

    #[test]
    fn failed_summarization_keeps_the_long_memory() {
        let store = Arc::new(InMemoryStore::new());
        let stores = Stores::from_memory(&store);
        let place = Place::new(PlaceId::from("place:home"), "Home");
        stores.places.create(&place).unwrap();
        let mut npc = Npc::new("Ada", PlaceId::from("place:home"));
        npc.long_memory = "x".repeat(60);
        stores.npcs.create(&npc).unwrap();

        // Empty script: the summarization call errors.
        let executor = ActionExecutor::new(
            stores.clone(),
            Arc::new(ScriptedOracle::default()),
            Arc::new(PromptEngine::new().unwrap()),
            WritePolicy::Strict,
            50,
        );
        executor.execute(&Action::idle(npc.id.clone())).unwrap();

        let npc = stores.npcs.get(&npc.id).unwrap();
        assert!(npc.long_memory.starts_with("xxx"));
        assert!(npc.long_memory.contains("relaxed"));
    }
}
