//! Shared game record

use crate::board::Board;
use crate::core::{GameId, GlobalParameter, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    CorporationSelection,
    StartingCardSelection,
    Action,
    Production,
    Complete,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GamePhase::Setup => "setup",
            GamePhase::CorporationSelection => "corporation_selection",
            GamePhase::StartingCardSelection => "starting_card_selection",
            GamePhase::Action => "action",
            GamePhase::Production => "production",
            GamePhase::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Current values of the global parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalParameters {
    pub temperature: i32,
    pub oxygen: i32,
    pub oceans: i32,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        GlobalParameters {
            temperature: -30,
            oxygen: 0,
            oceans: 0,
        }
    }
}

impl GlobalParameters {
    pub fn get(&self, parameter: GlobalParameter) -> i32 {
        match parameter {
            GlobalParameter::Temperature => self.temperature,
            GlobalParameter::Oxygen => self.oxygen,
            GlobalParameter::Oceans => self.oceans,
        }
    }

    pub fn set(&mut self, parameter: GlobalParameter, value: i32) {
        match parameter {
            GlobalParameter::Temperature => self.temperature = value,
            GlobalParameter::Oxygen => self.oxygen = value,
            GlobalParameter::Oceans => self.oceans = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub phase: GamePhase,
    pub generation: u32,
    pub global_parameters: GlobalParameters,
    pub current_turn: Option<PlayerId>,
    pub player_ids: Vec<PlayerId>,
    pub board: Board,
}

impl Game {
    pub fn new(id: impl Into<GameId>, board: Board) -> Self {
        Game {
            id: id.into(),
            phase: GamePhase::Setup,
            generation: 1,
            global_parameters: GlobalParameters::default(),
            current_turn: None,
            player_ids: Vec::new(),
            board,
        }
    }

    pub fn with_players(mut self, players: impl IntoIterator<Item = PlayerId>) -> Self {
        self.player_ids = players.into_iter().collect();
        if self.current_turn.is_none() {
            self.current_turn = self.player_ids.first().cloned();
        }
        self
    }

    pub fn with_parameters(mut self, parameters: GlobalParameters) -> Self {
        self.global_parameters = parameters;
        self
    }
}
