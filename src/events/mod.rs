//! Game-scoped domain events and the synchronous bus that carries them.
//!
//! Every mutation that other cards may react to (parameter raises, tile
//! placements, card plays, phase changes) is published as a typed
//! [`DomainEvent`]. Subscribers are plain closures; dispatch happens on the
//! publishing thread before `publish` returns.

mod bus;
mod types;

pub use bus::{EventBus, EventHandler, SubscriptionId};
pub use types::{
    CardDrawConfirmed, CardPlayed, DomainEvent, EventKind, ParameterChanged, PhaseChanged,
    PlacementBonusGained, TilePlaced,
};
