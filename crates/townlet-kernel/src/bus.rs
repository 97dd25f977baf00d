//! The phased event bus.
//!
//! A process-local set of live [`Event`] records plus an ordered
//! subscriber registry per event type. Three phases run per tick,
//! strictly in order:
//!
//! 1. `pre_tick`: every live `NPC_ACTION` event is delivered, in
//!    publication order, to the `NPC_ACTION` subscribers. Events are
//!    not removed here, only marked processed by the subscriber.
//! 2. `on_tick`: every processed event gets its durable processed mark
//!    and is evicted from the live set. Unprocessed events stay live
//!    into the next tick.
//! 3. `post_tick`: the bus synthesizes one ephemeral `NPC_DECISION`
//!    event and delivers it to every `NPC_DECISION` subscriber.
//!    Subscribers may publish new events during delivery; those land in
//!    a pending queue and join the live set only after the phase ends,
//!    so a phase never re-scans events published while it runs.
//!
//! Failure handling follows the configured [`WritePolicy`]. A failing
//! action subscriber always has its event marked processed-with-error
//! so it is never redelivered; under `Strict` the first error also
//! surfaces from the phase (and from [`crate::clock::SimClock::step`]),
//! under `BestEffort` it is only logged. The same applies to a failed
//! durable mark in `on_tick`. Decision subscribers degrade to `idle`
//! on their own, so `post_tick` only logs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use townlet_store::stores::EventStore;
use townlet_types::{Event, EventId, EventType};
use tracing::{debug, error};

use crate::config::WritePolicy;
use crate::error::KernelError;

/// A phase-scoped callback registered for one event type.
pub trait Subscriber: Send {
    /// Handle one delivered event.
    ///
    /// Action subscribers mark the event processed; decision subscribers
    /// publish next-tick action events through `ctx`.
    fn handle(&mut self, event: &mut Event, ctx: &mut BusContext<'_>) -> Result<(), KernelError>;
}

/// Publish access handed to subscribers during delivery.
///
/// Publishing persists the event immediately (the store assigns its
/// durable id) but queues it; the bus merges the queue into the live
/// set when the current phase ends.
pub struct BusContext<'a> {
    events: &'a Arc<dyn EventStore>,
    pending: &'a mut Vec<Event>,
}

impl BusContext<'_> {
    /// Persist and queue an event for the next tick.
    pub fn publish(&mut self, mut event: Event) -> Result<EventId, KernelError> {
        if event.created_at.is_none() {
            event.created_at = Some(Utc::now());
        }
        let id = self.events.append(&event)?;
        event.id = Some(id);
        self.pending.push(event);
        Ok(id)
    }
}

/// The phased publish/subscribe mechanism driven by the sim clock.
pub struct EventBus {
    live: Vec<Event>,
    subscribers: BTreeMap<EventType, Vec<Box<dyn Subscriber>>>,
    events: Arc<dyn EventStore>,
    write_policy: WritePolicy,
}

impl EventBus {
    /// Create a bus persisting published events through the given store.
    pub fn new(events: Arc<dyn EventStore>, write_policy: WritePolicy) -> Self {
        Self {
            live: Vec::new(),
            subscribers: BTreeMap::new(),
            events,
            write_policy,
        }
    }

    /// Publish an event outside any phase: persist it and append it to
    /// the live set. Returns the store-assigned id.
    pub fn publish(&mut self, mut event: Event) -> Result<EventId, KernelError> {
        if event.created_at.is_none() {
            event.created_at = Some(Utc::now());
        }
        let id = self.events.append(&event)?;
        event.id = Some(id);
        self.live.push(event);
        Ok(id)
    }

    /// Register a subscriber for an event type. Subscribers for the
    /// same type run in registration order.
    pub fn subscribe(&mut self, event_type: EventType, subscriber: Box<dyn Subscriber>) {
        self.subscribers.entry(event_type).or_default().push(subscriber);
    }

    /// The live event set, for inspection.
    pub fn live(&self) -> &[Event] {
        &self.live
    }

    /// Phase 1: deliver every live `NPC_ACTION` event to the action
    /// subscribers.
    ///
    /// Already-processed events are skipped, so re-running the phase
    /// never re-delivers a resolved event. A subscriber error marks
    /// the event processed-with-error rather than retrying it forever;
    /// under `Strict` the first error is also returned once the whole
    /// live set has been delivered.
    pub fn pre_tick(&mut self) -> Result<(), KernelError> {
        let mut pending = Vec::new();
        let mut first_error = None;
        let Some(subscribers) = self.subscribers.get_mut(&EventType::NpcAction) else {
            return Ok(());
        };
        let snapshot_len = self.live.len();
        for index in 0..snapshot_len {
            let Some(event) = self.live.get_mut(index) else {
                break;
            };
            if event.event_type() != EventType::NpcAction || event.processed {
                continue;
            }
            for subscriber in subscribers.iter_mut() {
                let mut ctx = BusContext {
                    events: &self.events,
                    pending: &mut pending,
                };
                if let Err(e) = subscriber.handle(event, &mut ctx) {
                    error!(event_id = ?event.id, error = %e, "action subscriber failed; marking event processed with error");
                    event.mark_processed(Utc::now());
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        self.live.append(&mut pending);
        finish_phase(self.write_policy, first_error)
    }

    /// Phase 2: durably mark processed events and evict them from the
    /// live set. A failed durable mark is logged; under `Strict` the
    /// first one is also returned after the eviction pass.
    pub fn on_tick(&mut self) -> Result<(), KernelError> {
        let mut first_error = None;
        for event in self.live.iter().filter(|e| e.processed) {
            let Some(id) = event.id else {
                debug!("processed event was never persisted, evicting without durable mark");
                continue;
            };
            let at = event.processed_at.unwrap_or_else(Utc::now);
            if let Err(e) = self.events.mark_processed(id, at) {
                error!(event_id = %id, error = %e, "failed to durably mark event processed");
                if first_error.is_none() {
                    first_error = Some(KernelError::Store(e));
                }
            }
        }
        self.live.retain(|event| !event.processed);
        finish_phase(self.write_policy, first_error)
    }

    /// Phase 3: synthesize one ephemeral `NPC_DECISION` event and
    /// deliver it to every decision subscriber. Events the subscribers
    /// publish join the live set afterwards, queued for the next tick.
    pub fn post_tick(&mut self) {
        let mut pending = Vec::new();
        let mut decision = Event::decision();
        if let Some(subscribers) = self.subscribers.get_mut(&EventType::NpcDecision) {
            for subscriber in subscribers.iter_mut() {
                let mut ctx = BusContext {
                    events: &self.events,
                    pending: &mut pending,
                };
                if let Err(e) = subscriber.handle(&mut decision, &mut ctx) {
                    error!(error = %e, "decision subscriber failed");
                }
            }
        }
        // The decision event itself is ephemeral and is dropped here.
        self.live.append(&mut pending);
    }
}

/// Resolve a phase's outcome against the write policy.
fn finish_phase(
    policy: WritePolicy,
    first_error: Option<KernelError>,
) -> Result<(), KernelError> {
    match (policy, first_error) {
        (WritePolicy::Strict, Some(e)) => Err(e),
        _ => Ok(()),
    }
}
