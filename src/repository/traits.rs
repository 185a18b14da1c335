//! Repository contracts consumed by the engine
//!
//! Every update call is a granular, per-record write. The engine reads a
//! snapshot with `get_by_id`, computes the new value, and writes it back;
//! callers serialize access per game so read-modify-write never interleaves.

use crate::board::HexCoord;
use crate::core::{
    Card, CardId, ForcedFirstAction, Game, GameId, GamePhase, GlobalParameter,
    PendingCardDrawSelection, PendingTileSelection, Player, PlayerAction, PlayerEffect, PlayerId,
    ResourceSet, TileKind, TileQueue,
};
use crate::Result;
use rustc_hash::FxHashMap;

/// Shared game records
pub trait GameRepository: Send + Sync {
    fn get_by_id(&self, game_id: &GameId) -> Result<Game>;

    fn update_temperature(&self, game_id: &GameId, value: i32) -> Result<()>;

    fn update_oxygen(&self, game_id: &GameId, value: i32) -> Result<()>;

    fn update_oceans(&self, game_id: &GameId, value: i32) -> Result<()>;

    fn update_phase(&self, game_id: &GameId, phase: GamePhase) -> Result<()>;

    fn update_current_turn(&self, game_id: &GameId, player_id: Option<PlayerId>) -> Result<()>;

    fn update_generation(&self, game_id: &GameId, generation: u32) -> Result<()>;

    /// Occupy a hex; returns the hex's placement bonus
    fn place_tile(
        &self,
        game_id: &GameId,
        coord: HexCoord,
        tile: TileKind,
        owner: Option<PlayerId>,
    ) -> Result<ResourceSet>;

    /// Dispatch to the per-parameter update
    fn update_global_parameter(&self, game_id: &GameId, parameter: GlobalParameter, value: i32) -> Result<()> {
        match parameter {
            GlobalParameter::Temperature => self.update_temperature(game_id, value),
            GlobalParameter::Oxygen => self.update_oxygen(game_id, value),
            GlobalParameter::Oceans => self.update_oceans(game_id, value),
        }
    }
}

/// Player records, keyed by game and player
pub trait PlayerRepository: Send + Sync {
    fn get_by_id(&self, game_id: &GameId, player_id: &PlayerId) -> Result<Player>;

    fn list_players(&self, game_id: &GameId) -> Result<Vec<Player>>;

    fn update_resources(&self, game_id: &GameId, player_id: &PlayerId, resources: ResourceSet) -> Result<()>;

    fn update_production(&self, game_id: &GameId, player_id: &PlayerId, production: ResourceSet) -> Result<()>;

    fn update_resource_storage(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        storage: FxHashMap<CardId, i32>,
    ) -> Result<()>;

    fn update_player_actions(&self, game_id: &GameId, player_id: &PlayerId, actions: Vec<PlayerAction>) -> Result<()>;

    fn update_player_effects(&self, game_id: &GameId, player_id: &PlayerId, effects: Vec<PlayerEffect>) -> Result<()>;

    fn update_terraform_rating(&self, game_id: &GameId, player_id: &PlayerId, rating: i32) -> Result<()>;

    fn update_victory_points(&self, game_id: &GameId, player_id: &PlayerId, points: i32) -> Result<()>;

    fn update_corporation(&self, game_id: &GameId, player_id: &PlayerId, corporation: Option<CardId>) -> Result<()>;

    fn update_hand(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()>;

    fn update_played_cards(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()>;

    /// Store a queue of tiles the player must place, one entry per tile.
    /// An empty queue is a no-op.
    fn create_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, source: &str, tiles: Vec<TileKind>) -> Result<()>;

    fn update_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, queue: Option<TileQueue>) -> Result<()>;

    fn update_pending_tile_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingTileSelection>,
    ) -> Result<()>;

    fn update_pending_card_draw_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingCardDrawSelection>,
    ) -> Result<()>;

    fn update_forced_first_action(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        action: Option<ForcedFirstAction>,
    ) -> Result<()>;
}

/// Read-only card catalog
pub trait CardRepository: Send + Sync {
    fn get_card_by_id(&self, card_id: &CardId) -> Result<Card>;

    /// Project cards (everything except corporations and preludes)
    fn get_starting_card_pool(&self) -> Result<Vec<Card>>;

    fn get_corporations(&self) -> Result<Vec<Card>>;
}

/// Per-game project card deck
pub trait CardDeckRepository: Send + Sync {
    /// Draw up to `count` cards; fewer are returned when the deck runs out
    fn draw_project_cards(&self, game_id: &GameId, count: u32) -> Result<Vec<CardId>>;
}
