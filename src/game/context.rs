//! Shared handles every engine service works against

use crate::config::RulesConfig;
use crate::core::{Game, GameId, Player, PlayerId};
use crate::events::EventBus;
use crate::repository::{CardDeckRepository, CardRepository, GameRepository, PlayerRepository};
use crate::Result;
use std::sync::Arc;

/// Repositories, event bus and ruleset of one game session
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct EngineContext {
    pub games: Arc<dyn GameRepository>,
    pub players: Arc<dyn PlayerRepository>,
    pub cards: Arc<dyn CardRepository>,
    pub deck: Arc<dyn CardDeckRepository>,
    pub bus: EventBus,
    pub rules: Arc<RulesConfig>,
}

impl EngineContext {
    pub fn new(
        games: Arc<dyn GameRepository>,
        players: Arc<dyn PlayerRepository>,
        cards: Arc<dyn CardRepository>,
        deck: Arc<dyn CardDeckRepository>,
        rules: Arc<RulesConfig>,
    ) -> Self {
        EngineContext {
            games,
            players,
            cards,
            deck,
            bus: EventBus::new(),
            rules,
        }
    }

    pub fn game(&self, game_id: &GameId) -> Result<Game> {
        self.games.get_by_id(game_id)
    }

    pub fn player(&self, game_id: &GameId, player_id: &PlayerId) -> Result<Player> {
        self.players.get_by_id(game_id, player_id)
    }
}
