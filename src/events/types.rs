//! Typed event payloads

use crate::board::HexCoord;
use crate::core::{CardId, CardType, GameId, GamePhase, GlobalParameter, PlayerId, ResourceSet, Tag, TileKind};
use serde::{Deserialize, Serialize};

/// Routing key for subscriptions
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    TemperatureChanged,
    OxygenChanged,
    OceansChanged,
    TilePlaced,
    GamePhaseChanged,
    CardDrawConfirmed,
    CardPlayed,
    PlacementBonusGained,
}

impl EventKind {
    pub fn for_parameter(parameter: GlobalParameter) -> Self {
        match parameter {
            GlobalParameter::Temperature => EventKind::TemperatureChanged,
            GlobalParameter::Oxygen => EventKind::OxygenChanged,
            GlobalParameter::Oceans => EventKind::OceansChanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterChanged {
    pub game_id: GameId,
    pub old_value: i32,
    pub new_value: i32,
}

impl ParameterChanged {
    pub fn is_raise(&self) -> bool {
        self.new_value > self.old_value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePlaced {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub tile: TileKind,
    pub coord: HexCoord,
    /// What requested the placement (card id, corporation id, ...)
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChanged {
    pub game_id: GameId,
    pub old_phase: GamePhase,
    pub new_phase: GamePhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDrawConfirmed {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub source: String,
    pub cards: Vec<CardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlayed {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub card_id: CardId,
    pub card_name: String,
    pub card_type: CardType,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementBonusGained {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub resources: ResourceSet,
    pub coord: HexCoord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    TemperatureChanged(ParameterChanged),
    OxygenChanged(ParameterChanged),
    OceansChanged(ParameterChanged),
    TilePlaced(TilePlaced),
    GamePhaseChanged(PhaseChanged),
    CardDrawConfirmed(CardDrawConfirmed),
    CardPlayed(CardPlayed),
    PlacementBonusGained(PlacementBonusGained),
}

impl DomainEvent {
    pub fn parameter_changed(parameter: GlobalParameter, payload: ParameterChanged) -> Self {
        match parameter {
            GlobalParameter::Temperature => DomainEvent::TemperatureChanged(payload),
            GlobalParameter::Oxygen => DomainEvent::OxygenChanged(payload),
            GlobalParameter::Oceans => DomainEvent::OceansChanged(payload),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::TemperatureChanged(_) => EventKind::TemperatureChanged,
            DomainEvent::OxygenChanged(_) => EventKind::OxygenChanged,
            DomainEvent::OceansChanged(_) => EventKind::OceansChanged,
            DomainEvent::TilePlaced(_) => EventKind::TilePlaced,
            DomainEvent::GamePhaseChanged(_) => EventKind::GamePhaseChanged,
            DomainEvent::CardDrawConfirmed(_) => EventKind::CardDrawConfirmed,
            DomainEvent::CardPlayed(_) => EventKind::CardPlayed,
            DomainEvent::PlacementBonusGained(_) => EventKind::PlacementBonusGained,
        }
    }

    pub fn game_id(&self) -> &GameId {
        match self {
            DomainEvent::TemperatureChanged(e)
            | DomainEvent::OxygenChanged(e)
            | DomainEvent::OceansChanged(e) => &e.game_id,
            DomainEvent::TilePlaced(e) => &e.game_id,
            DomainEvent::GamePhaseChanged(e) => &e.game_id,
            DomainEvent::CardDrawConfirmed(e) => &e.game_id,
            DomainEvent::CardPlayed(e) => &e.game_id,
            DomainEvent::PlacementBonusGained(e) => &e.game_id,
        }
    }

    /// Player who caused the event, for self-player target filtering
    ///
    /// Global parameter changes carry no originating player.
    pub fn originating_player(&self) -> Option<&PlayerId> {
        match self {
            DomainEvent::TilePlaced(e) => Some(&e.player_id),
            DomainEvent::CardPlayed(e) => Some(&e.player_id),
            DomainEvent::PlacementBonusGained(e) => Some(&e.player_id),
            _ => None,
        }
    }
}
