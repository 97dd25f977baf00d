//! The closed sum type over the seven NPC actions.
//!
//! The decision oracle replies with a JSON object tagged by
//! `action_type`; deserializing it lands directly on one of these
//! variants, so a malformed or unknown payload is a parse-time error
//! handled once at the oracle boundary rather than a runtime
//! fallthrough in the executor.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, NpcId, PlaceId};

/// A requested NPC action with its arguments, awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    /// Move to an adjacent place.
    Move {
        /// The acting NPC.
        npc_id: NpcId,
        /// Destination place.
        place_id: PlaceId,
    },
    /// Consume items from inventory.
    Eat {
        /// The acting NPC.
        npc_id: NpcId,
        /// The item to consume.
        item_id: ItemId,
        /// How many to consume.
        item_amount: u32,
    },
    /// Sleep for a number of sim hours.
    Sleep {
        /// The acting NPC.
        npc_id: NpcId,
        /// Hours to sleep.
        duration_hours: u32,
    },
    /// Work a shift for pay.
    Work {
        /// The acting NPC.
        npc_id: NpcId,
        /// Hours to work.
        duration_hours: u32,
    },
    /// Buy items from the current place's shop.
    Buy {
        /// The acting NPC.
        npc_id: NpcId,
        /// The item to buy.
        item_id: ItemId,
        /// How many to buy.
        item_amount: u32,
    },
    /// Sell items from inventory at a shop.
    Sell {
        /// The acting NPC.
        npc_id: NpcId,
        /// The item to sell.
        item_id: ItemId,
        /// How many to sell.
        item_amount: u32,
    },
    /// Do nothing in particular; always succeeds.
    Idle {
        /// The acting NPC.
        npc_id: NpcId,
    },
}

impl Action {
    /// The guaranteed-total fallback action.
    pub const fn idle(npc_id: NpcId) -> Self {
        Self::Idle { npc_id }
    }

    /// The acting NPC's id.
    pub const fn npc_id(&self) -> &NpcId {
        match self {
            Self::Move { npc_id, .. }
            | Self::Eat { npc_id, .. }
            | Self::Sleep { npc_id, .. }
            | Self::Work { npc_id, .. }
            | Self::Buy { npc_id, .. }
            | Self::Sell { npc_id, .. }
            | Self::Idle { npc_id } => npc_id,
        }
    }

    /// The wire tag for this action, as it appears in `action_type`.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Eat { .. } => "eat",
            Self::Sleep { .. } => "sleep",
            Self::Work { .. } => "work",
            Self::Buy { .. } => "buy",
            Self::Sell { .. } => "sell",
            Self::Idle { .. } => "idle",
        }
    }
}
