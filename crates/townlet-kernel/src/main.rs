//! Townlet kernel binary.
//!
//! Wires the kernel together against an in-memory store with a small
//! seeded town, starts the background runtime, and runs until
//! interrupted by a stop file or a bounded demo duration. With no
//! oracle API key configured, a scripted oracle keeps the town moving
//! so the binary is useful for local smoke runs.
//!
//! # Startup sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (`townlet.toml` + `TOWNLET__*` env vars)
//! 3. Seed the demo town, catalog, and NPCs
//! 4. Build the oracle backend, bus, executor, and decision callbacks
//! 5. Start the runtime and tick until the demo window closes

use std::sync::Arc;
use std::time::Duration;

use townlet_kernel::{
    register_npc_callbacks, ActionExecutor, EventBus, KernelConfig, KernelRuntime, SimClock,
};
use townlet_oracle::{DecisionOracle, HttpOracle, PromptEngine, ScriptedOracle};
use townlet_store::stores::{EventStore, Stores};
use townlet_store::InMemoryStore;
use townlet_types::{
    Effect, EffectAttribute, EffectId, EventType, Item, ItemId, ItemType, Npc, Place, PlaceId,
    PlaceTag, Road, RoadId, Town, TownId,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// How many ticks the demo run observes before shutting down.
const DEMO_TICKS: u64 = 24;

/// Wall-clock bound on the demo run, whichever comes first.
const DEMO_DEADLINE: Duration = Duration::from_secs(60);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("townlet kernel starting");

    let config_path = std::env::args().nth(1);
    let config = KernelConfig::load(config_path.as_deref())?;
    info!(
        town_id = config.town.town_id,
        tick_interval_s = config.kernel.tick_interval_seconds,
        write_policy = ?config.persistence.write_policy,
        "configuration loaded"
    );

    let store = Arc::new(InMemoryStore::new());
    let stores = Stores::from_memory(&store);
    let town_id = TownId::from(config.town.town_id.as_str());
    seed_town(&stores, &town_id)?;
    info!("demo town seeded");

    let oracle: Arc<dyn DecisionOracle> = if config.oracle.api_key.is_empty() {
        info!("no oracle api key configured, using scripted decisions");
        Arc::new(demo_oracle())
    } else {
        Arc::new(HttpOracle::new(config.oracle.to_http_config())?)
    };
    let prompts = Arc::new(PromptEngine::new()?);

    let mut bus = EventBus::new(
        Arc::clone(&store) as Arc<dyn EventStore>,
        config.persistence.write_policy,
    );
    bus.subscribe(
        EventType::NpcAction,
        Box::new(ActionExecutor::new(
            stores.clone(),
            Arc::clone(&oracle),
            Arc::clone(&prompts),
            config.persistence.write_policy,
            config.npc.max_long_memory_chars,
        )),
    );
    let registered = register_npc_callbacks(
        &mut bus,
        &stores,
        &oracle,
        &prompts,
        &town_id,
        config.kernel.tick_interval_seconds,
    )?;
    info!(registered, "kernel wired");

    let clock = SimClock::new(
        town_id.clone(),
        config.kernel.tick_interval_seconds,
        bus,
        Arc::clone(&stores.towns),
    );
    let mut runtime = KernelRuntime::new(clock);
    runtime.start()?;

    let started = std::time::Instant::now();
    while runtime.tick_count() < DEMO_TICKS && started.elapsed() < DEMO_DEADLINE {
        std::thread::sleep(Duration::from_millis(200));
    }
    runtime.stop();

    let town_time = runtime.with_clock(|clock| clock.town_time(chrono::Utc::now()))?;
    info!(ticks = runtime.tick_count(), town_time, "demo run complete");
    for npc in stores.npcs.list_active()? {
        info!(
            npc = %npc.name,
            location = %npc.location_id,
            hunger = npc.hunger,
            energy = npc.energy,
            mood = npc.mood,
            "final npc state"
        );
    }

    Ok(())
}

/// A scripted oracle cycling through a day of plausible decisions.
fn demo_oracle() -> ScriptedOracle {
    let day = [
        r#"{"action_type": "move", "place_id": "place:bakery"}"#,
        r#"{"action_type": "work", "duration_hours": 4}"#,
        r#"{"action_type": "buy", "item_id": "item:bread", "item_amount": 1}"#,
        r#"{"action_type": "eat", "item_id": "item:bread", "item_amount": 1}"#,
        r#"{"action_type": "move", "place_id": "place:home"}"#,
        r#"{"action_type": "sleep", "duration_hours": 8}"#,
    ];
    ScriptedOracle::new(day.iter().copied().cycle().take(256))
}

/// Seed the demo world: one town, three places, connecting roads, the
/// coin catalog, one food item, and two NPCs.
fn seed_town(stores: &Stores, town_id: &TownId) -> anyhow::Result<()> {
    stores.towns.create(&Town {
        id: town_id.clone(),
        name: String::from("Townlet"),
        description: String::from("a small simulated town"),
        sim_start_time: None,
    })?;

    let mut home = Place::new(PlaceId::from("place:home"), "Home");
    home.tags.insert(PlaceTag::House);
    let mut bakery = Place::new(PlaceId::from("place:bakery"), "Bakery");
    bakery.tags.insert(PlaceTag::Shop);
    bakery.tags.insert(PlaceTag::Workable);
    bakery.shop_inventory.insert(ItemId::from("item:bread"), 50);
    let mut square = Place::new(PlaceId::from("place:square"), "Town Square");
    square.tags.insert(PlaceTag::Entertainment);
    for place in [&home, &bakery, &square] {
        stores.places.create(place)?;
    }

    let roads = [
        ("road:home-bakery", "place:home", "place:bakery", "east"),
        ("road:home-square", "place:home", "place:square", "south"),
        ("road:bakery-square", "place:bakery", "place:square", "west"),
    ];
    for (id, from, to, direction) in roads {
        stores.roads.create(&Road {
            id: RoadId::from(id),
            from_place: PlaceId::from(from),
            to_place: PlaceId::from(to),
            direction: String::from(direction),
        })?;
    }

    stores.effects.create(&Effect {
        id: EffectId::from("effect:filling"),
        name: String::from("filling"),
        attribute: EffectAttribute::Hunger,
        change: 25,
    })?;
    stores.items.create(&Item {
        id: ItemId::from("item:bread"),
        name: String::from("bread"),
        value: 10,
        item_type: ItemType::Consumable,
        effect_ids: vec![EffectId::from("effect:filling")],
        description: String::from("a fresh loaf"),
    })?;
    for (id, name, value) in [
        ("item:bronze_coin", "bronze coin", 1_u64),
        ("item:silver_coin", "silver coin", 10),
        ("item:gold_coin", "gold coin", 100),
        ("item:platinum_coin", "platinum coin", 1000),
    ] {
        stores.items.create(&Item {
            id: ItemId::from(id),
            name: String::from(name),
            value,
            item_type: ItemType::Monetary,
            effect_ids: Vec::new(),
            description: String::new(),
        })?;
    }

    for name in ["Ada", "Bruno"] {
        let mut npc = Npc::new(name, PlaceId::from("place:home"));
        npc.inventory.insert(ItemId::from("item:silver_coin"), 5);
        stores.npcs.create(&npc)?;
    }
    Ok(())
}
