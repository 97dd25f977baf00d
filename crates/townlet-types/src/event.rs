//! The event record that flows through the kernel's event bus.
//!
//! Events are created by any publisher, mutated only by the bus (the
//! processed flag) and the store (id assignment), and evicted from the
//! live set once processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::enums::EventType;
use crate::ids::{EventId, NpcId};

/// The typed payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// An action intent awaiting resolution by the executor.
    Action {
        /// The parsed action intent.
        intent: Action,
    },
    /// The per-tick decision prompt synthesized by the bus.
    Decision,
}

/// One event in the bus's live set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned durable id; `None` until first persisted.
    #[serde(default)]
    pub id: Option<EventId>,
    /// The NPC this event concerns, if any.
    #[serde(default)]
    pub npc_id: Option<NpcId>,
    /// Typed payload.
    pub payload: EventPayload,
    /// Publication timestamp; assigned by the bus if absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Whether a subscriber has resolved this event.
    #[serde(default)]
    pub processed: bool,
    /// Resolution timestamp, set together with `processed`.
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Create a fresh, unpersisted action event for the intent's NPC.
    pub fn action(intent: Action) -> Self {
        let npc_id = intent.npc_id().clone();
        Self {
            id: None,
            npc_id: Some(npc_id),
            payload: EventPayload::Action { intent },
            created_at: None,
            processed: false,
            processed_at: None,
        }
    }

    /// Create the per-tick decision event. Not persisted; it lives only
    /// for the duration of the `post_tick` phase.
    pub fn decision() -> Self {
        Self {
            id: None,
            npc_id: None,
            payload: EventPayload::Decision,
            created_at: Some(Utc::now()),
            processed: false,
            processed_at: None,
        }
    }

    /// The routing tag for this event.
    pub const fn event_type(&self) -> EventType {
        match self.payload {
            EventPayload::Action { .. } => EventType::NpcAction,
            EventPayload::Decision => EventType::NpcDecision,
        }
    }

    /// Mark this event resolved with the given timestamp.
    ///
    /// The executor calls this exactly once per event.
    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        self.processed = true;
        self.processed_at = Some(at);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_event_carries_npc_id_and_type() {
        let event = Event::action(Action::idle(NpcId::from("npc:ada")));
        assert_eq!(event.npc_id, Some(NpcId::from("npc:ada")));
        assert_eq!(event.event_type(), EventType::NpcAction);
        assert!(!event.processed);
    }

    #[test]
    fn decision_event_has_no_npc() {
        let event = Event::decision();
        assert_eq!(event.npc_id, None);
        assert_eq!(event.event_type(), EventType::NpcDecision);
    }

    #[test]
    fn mark_processed_sets_flag_and_timestamp() {
        let mut event = Event::action(Action::idle(NpcId::from("npc:ada")));
        let at = Utc::now();
        event.mark_processed(at);
        assert!(event.processed);
        assert_eq!(event.processed_at, Some(at));
    }

    #[test]
    fn event_round_trips_through_json_text() {
        let mut event = Event::action(Action::Buy {
            npc_id: NpcId::from("npc:ada"),
            item_id: crate::ids::ItemId::from("item:elixir"),
            item_amount: 2,
        });
        event.id = Some(EventId(7));
        event.created_at = Some(Utc::now());
        let text = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
