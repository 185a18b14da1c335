//! Core domain types: identifiers, resources, cards, players and games

pub mod card;
pub mod game;
pub mod player;
pub mod resources;
pub mod types;

pub use card::{
    Behavior, BehaviorShape, Card, CardType, Choice, Location, PerCondition, Requirement,
    RequirementKind, ResourceCondition, ResourceStorage, Target, Trigger, TriggerCondition,
    TriggerConditionKind, TriggerType, VpCondition, VpConditionKind,
};
pub use game::{Game, GamePhase, GlobalParameters};
pub use player::{
    ForcedActionState, ForcedFirstAction, PaymentSubstitute, PendingCardDrawSelection,
    PendingTileSelection, Player, PlayerAction, PlayerEffect, TileQueue,
};
pub use resources::{BaseResource, GlobalParameter, ResourceKind, ResourceSet, StorageResource, TileKind};
pub use types::{CardId, GameId, PlayerId, Tag};
