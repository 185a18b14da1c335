//! Synchronous, game-scoped event bus

use super::types::{DomainEvent, EventKind};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Callback invoked for each matching event
pub type EventHandler = Arc<dyn Fn(&DomainEvent) -> Result<()> + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

/// Event bus shared by all services of one game session
///
/// Handlers run on the publishing thread, in registration order, before
/// `publish` returns. The subscription list is snapshotted before dispatch
/// and the lock released, so handlers may publish or (un)subscribe.
/// A failing handler is logged and does not stop the remaining handlers.
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&DomainEvent) -> Result<()> + Send + Sync + 'static,
    {
        let mut state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.subscriptions.push(Subscription {
            id,
            kind,
            handler: Arc::new(handler),
        });
        tracing::trace!(subscription = %id, ?kind, "subscribed");
        Ok(id)
    }

    /// Remove a subscription; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let mut state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        let before = state.subscriptions.len();
        state.subscriptions.retain(|s| s.id != id);
        Ok(state.subscriptions.len() != before)
    }

    fn is_registered(&self, id: SubscriptionId) -> Result<bool> {
        let state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        Ok(state.subscriptions.iter().any(|s| s.id == id))
    }

    /// Dispatch an event to every handler registered for its kind
    ///
    /// Returns the number of handlers that ran successfully.
    pub fn publish(&self, event: DomainEvent) -> Result<usize> {
        let kind = event.kind();
        let handlers: Vec<(SubscriptionId, EventHandler)> = {
            let state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
            state
                .subscriptions
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| (s.id, Arc::clone(&s.handler)))
                .collect()
        };

        if handlers.is_empty() {
            tracing::trace!(?kind, "no subscribers");
            return Ok(0);
        }

        let mut delivered = 0;
        for (id, handler) in handlers {
            // Skip handlers removed by an earlier handler of this dispatch
            if !self.is_registered(id)? {
                continue;
            }
            match handler(&event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::error!(subscription = %id, ?kind, error = %err, "event handler failed");
                }
            }
        }
        tracing::debug!(?kind, game_id = %event.game_id(), delivered, "event published");
        Ok(delivered)
    }

    /// Drop every subscription
    ///
    /// Handlers commonly capture a clone of the bus; clearing breaks those
    /// reference cycles when a session ends.
    pub fn clear(&self) -> Result<usize> {
        let mut state = self.state.lock().map_err(|_| EngineError::LockPoisoned)?;
        let dropped = state.subscriptions.len();
        state.subscriptions.clear();
        Ok(dropped)
    }

    pub fn subscription_count(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.subscriptions.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameId, GamePhase};
    use crate::events::{ParameterChanged, PhaseChanged};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temperature(old_value: i32, new_value: i32) -> DomainEvent {
        DomainEvent::TemperatureChanged(ParameterChanged {
            game_id: GameId::new("g1"),
            old_value,
            new_value,
        })
    }

    #[test]
    fn test_publish_routes_by_kind() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        bus.subscribe(EventKind::TemperatureChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert_eq!(bus.publish(temperature(0, 2)).unwrap(), 1);
        let phase = DomainEvent::GamePhaseChanged(PhaseChanged {
            game_id: GameId::new("g1"),
            old_phase: GamePhase::Setup,
            new_phase: GamePhase::Action,
        });
        assert_eq!(bus.publish(phase).unwrap(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventKind::OxygenChanged, |_| Ok(())).unwrap();
        assert_eq!(bus.subscription_count(), 1);
        assert!(bus.unsubscribe(id).unwrap());
        assert!(!bus.unsubscribe(id).unwrap());
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn test_clear_drops_cloned_handles_too() {
        let bus = EventBus::new();
        let shared = bus.clone();
        shared.subscribe(EventKind::OxygenChanged, |_| Ok(())).unwrap();
        shared.subscribe(EventKind::TilePlaced, |_| Ok(())).unwrap();

        assert_eq!(bus.clear().unwrap(), 2);
        assert_eq!(shared.subscription_count(), 0);
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.subscribe(EventKind::TemperatureChanged, |_| {
            Err(EngineError::InvalidAction("boom".into()))
        })
        .unwrap();
        let counter = Arc::clone(&hits);
        bus.subscribe(EventKind::TemperatureChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert_eq!(bus.publish(temperature(0, 2)).unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_can_reenter_the_bus() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        bus.subscribe(EventKind::OxygenChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        let inner = bus.clone();
        bus.subscribe(EventKind::TemperatureChanged, move |_| {
            inner.publish(DomainEvent::OxygenChanged(ParameterChanged {
                game_id: GameId::new("g1"),
                old_value: 0,
                new_value: 1,
            }))?;
            Ok(())
        })
        .unwrap();

        bus.publish(temperature(0, 2)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
