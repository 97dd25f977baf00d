//! Per-NPC decision callbacks.
//!
//! During `post_tick` every registered callback loads its NPC fresh,
//! renders the decision prompt, asks the oracle, parses the reply into
//! a typed action, and publishes it for the next tick. Oracle failure
//! of any kind degrades to `idle`; only store failures propagate.

use std::sync::Arc;

use townlet_oracle::{parse_action, DecisionOracle, PromptEngine};
use townlet_store::stores::Stores;
use townlet_types::{Action, Event, EventPayload, EventType, NpcId, TownId};
use tracing::{debug, info, warn};

use crate::bus::{BusContext, EventBus, Subscriber};
use crate::clock::town_time;
use crate::error::KernelError;

/// Decides one NPC's next action each tick.
pub struct NpcDecisionCallback {
    npc_id: NpcId,
    stores: Stores,
    oracle: Arc<dyn DecisionOracle>,
    prompts: Arc<PromptEngine>,
    town_id: TownId,
    tick_interval_seconds: i64,
}

impl NpcDecisionCallback {
    /// Construct a callback for one NPC.
    pub const fn new(
        npc_id: NpcId,
        stores: Stores,
        oracle: Arc<dyn DecisionOracle>,
        prompts: Arc<PromptEngine>,
        town_id: TownId,
        tick_interval_seconds: i64,
    ) -> Self {
        Self {
            npc_id,
            stores,
            oracle,
            prompts,
            town_id,
            tick_interval_seconds,
        }
    }

    /// Produce this NPC's next action: prompt, generate, parse. Any
    /// oracle-side failure yields `idle`.
    fn decide(&self) -> Result<Action, KernelError> {
        let npc = self.stores.npcs.get(&self.npc_id)?;

        let now = chrono::Utc::now();
        let time_text = town_time(
            &self.stores.towns,
            &self.town_id,
            self.tick_interval_seconds,
            now,
        )
        .unwrap_or_else(|_| String::from("Day 0, 00:00"));

        let context = serde_json::json!({
            "town_time": time_text,
            "npc": npc,
        });

        let prompt = match self.prompts.render_decision(&context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(npc_id = %self.npc_id, error = %e, "decision prompt render failed, idling");
                return Ok(Action::idle(self.npc_id.clone()));
            }
        };

        let raw = match self.oracle.generate(&prompt) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(npc_id = %self.npc_id, backend = self.oracle.name(), error = %e, "oracle call failed, idling");
                return Ok(Action::idle(self.npc_id.clone()));
            }
        };

        Ok(parse_action(&raw, &self.npc_id))
    }
}

impl Subscriber for NpcDecisionCallback {
    /// React to the per-tick decision event by publishing this NPC's
    /// next action intent. Dead NPCs no longer decide.
    fn handle(&mut self, event: &mut Event, ctx: &mut BusContext<'_>) -> Result<(), KernelError> {
        if !matches!(event.payload, EventPayload::Decision) {
            return Ok(());
        }
        let npc = self.stores.npcs.get(&self.npc_id)?;
        if npc.is_dead {
            debug!(npc_id = %self.npc_id, "skipping decision for dead npc");
            return Ok(());
        }
        let action = self.decide()?;
        debug!(npc_id = %self.npc_id, kind = action.kind(), "decision published");
        ctx.publish(Event::action(action))?;
        Ok(())
    }
}

/// Registration pass run at kernel startup: subscribe one decision
/// callback per active NPC. Returns how many were registered.
pub fn register_npc_callbacks(
    bus: &mut EventBus,
    stores: &Stores,
    oracle: &Arc<dyn DecisionOracle>,
    prompts: &Arc<PromptEngine>,
    town_id: &TownId,
    tick_interval_seconds: i64,
) -> Result<usize, KernelError> {
    let active = stores.npcs.list_active()?;
    let count = active.len();
    for npc in active {
        bus.subscribe(
            EventType::NpcDecision,
            Box::new(NpcDecisionCallback::new(
                npc.id,
                stores.clone(),
                Arc::clone(oracle),
                Arc::clone(prompts),
                town_id.clone(),
                tick_interval_seconds,
            )),
        );
    }
    info!(count, "npc decision callbacks registered");
    Ok(count)
}
