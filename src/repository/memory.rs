//! In-memory repository implementations
//!
//! Backed by `RwLock`-guarded hash maps. Suitable for tests, tools, and
//! single-process servers that keep all games in memory.

use super::traits::{CardDeckRepository, CardRepository, GameRepository, PlayerRepository};
use crate::board::HexCoord;
use crate::core::{
    Card, CardId, CardType, ForcedFirstAction, Game, GameId, GamePhase, PendingCardDrawSelection,
    PendingTileSelection, Player, PlayerAction, PlayerEffect, PlayerId, ResourceSet, TileKind, TileQueue,
};
use crate::{EngineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<FxHashMap<GameId, Game>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, game: Game) -> Result<()> {
        let mut games = self.games.write().map_err(|_| EngineError::LockPoisoned)?;
        games.insert(game.id.clone(), game);
        Ok(())
    }

    pub fn remove(&self, game_id: &GameId) -> Result<Option<Game>> {
        let mut games = self.games.write().map_err(|_| EngineError::LockPoisoned)?;
        Ok(games.remove(game_id))
    }

    fn with_game<T>(&self, game_id: &GameId, f: impl FnOnce(&mut Game) -> Result<T>) -> Result<T> {
        let mut games = self.games.write().map_err(|_| EngineError::LockPoisoned)?;
        let game = games
            .get_mut(game_id)
            .ok_or_else(|| EngineError::GameNotFound(game_id.clone()))?;
        f(game)
    }
}

impl GameRepository for InMemoryGameRepository {
    fn get_by_id(&self, game_id: &GameId) -> Result<Game> {
        let games = self.games.read().map_err(|_| EngineError::LockPoisoned)?;
        games
            .get(game_id)
            .cloned()
            .ok_or_else(|| EngineError::GameNotFound(game_id.clone()))
    }

    fn update_temperature(&self, game_id: &GameId, value: i32) -> Result<()> {
        self.with_game(game_id, |g| {
            g.global_parameters.temperature = value;
            Ok(())
        })
    }

    fn update_oxygen(&self, game_id: &GameId, value: i32) -> Result<()> {
        self.with_game(game_id, |g| {
            g.global_parameters.oxygen = value;
            Ok(())
        })
    }

    fn update_oceans(&self, game_id: &GameId, value: i32) -> Result<()> {
        self.with_game(game_id, |g| {
            g.global_parameters.oceans = value;
            Ok(())
        })
    }

    fn update_phase(&self, game_id: &GameId, phase: GamePhase) -> Result<()> {
        self.with_game(game_id, |g| {
            g.phase = phase;
            Ok(())
        })
    }

    fn update_current_turn(&self, game_id: &GameId, player_id: Option<PlayerId>) -> Result<()> {
        self.with_game(game_id, |g| {
            g.current_turn = player_id;
            Ok(())
        })
    }

    fn update_generation(&self, game_id: &GameId, generation: u32) -> Result<()> {
        self.with_game(game_id, |g| {
            g.generation = generation;
            Ok(())
        })
    }

    fn place_tile(
        &self,
        game_id: &GameId,
        coord: HexCoord,
        tile: TileKind,
        owner: Option<PlayerId>,
    ) -> Result<ResourceSet> {
        self.with_game(game_id, |g| g.board.occupy(coord, tile, owner))
    }
}

#[derive(Default)]
pub struct InMemoryPlayerRepository {
    players: RwLock<FxHashMap<GameId, Vec<Player>>>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, game_id: &GameId, player: Player) -> Result<()> {
        let mut players = self.players.write().map_err(|_| EngineError::LockPoisoned)?;
        let roster = players.entry(game_id.clone()).or_default();
        roster.retain(|p| p.id != player.id);
        roster.push(player);
        Ok(())
    }

    pub fn remove_game(&self, game_id: &GameId) -> Result<()> {
        let mut players = self.players.write().map_err(|_| EngineError::LockPoisoned)?;
        players.remove(game_id);
        Ok(())
    }

    fn with_player<T>(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        f: impl FnOnce(&mut Player) -> T,
    ) -> Result<T> {
        let mut players = self.players.write().map_err(|_| EngineError::LockPoisoned)?;
        let player = players
            .get_mut(game_id)
            .and_then(|roster| roster.iter_mut().find(|p| &p.id == player_id))
            .ok_or_else(|| EngineError::PlayerNotFound {
                game: game_id.clone(),
                player: player_id.clone(),
            })?;
        Ok(f(player))
    }
}

impl PlayerRepository for InMemoryPlayerRepository {
    fn get_by_id(&self, game_id: &GameId, player_id: &PlayerId) -> Result<Player> {
        let players = self.players.read().map_err(|_| EngineError::LockPoisoned)?;
        players
            .get(game_id)
            .and_then(|roster| roster.iter().find(|p| &p.id == player_id))
            .cloned()
            .ok_or_else(|| EngineError::PlayerNotFound {
                game: game_id.clone(),
                player: player_id.clone(),
            })
    }

    fn list_players(&self, game_id: &GameId) -> Result<Vec<Player>> {
        let players = self.players.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(players.get(game_id).cloned().unwrap_or_default())
    }

    fn update_resources(&self, game_id: &GameId, player_id: &PlayerId, resources: ResourceSet) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.resources = resources)
    }

    fn update_production(&self, game_id: &GameId, player_id: &PlayerId, production: ResourceSet) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.production = production)
    }

    fn update_resource_storage(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        storage: FxHashMap<CardId, i32>,
    ) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.resource_storage = storage)
    }

    fn update_player_actions(&self, game_id: &GameId, player_id: &PlayerId, actions: Vec<PlayerAction>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.actions = actions)
    }

    fn update_player_effects(&self, game_id: &GameId, player_id: &PlayerId, effects: Vec<PlayerEffect>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.effects = effects)
    }

    fn update_terraform_rating(&self, game_id: &GameId, player_id: &PlayerId, rating: i32) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.terraform_rating = rating)
    }

    fn update_victory_points(&self, game_id: &GameId, player_id: &PlayerId, points: i32) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.victory_points = points)
    }

    fn update_corporation(&self, game_id: &GameId, player_id: &PlayerId, corporation: Option<CardId>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.corporation = corporation)
    }

    fn update_hand(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.cards = cards)
    }

    fn update_played_cards(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.played_cards = cards)
    }

    fn create_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, source: &str, tiles: Vec<TileKind>) -> Result<()> {
        if tiles.is_empty() {
            return Ok(());
        }
        self.with_player(game_id, player_id, |p| {
            // A live queue keeps its source; new tiles wait behind it
            if let Some(queue) = p.tile_queue.as_mut() {
                queue.items.extend(tiles);
            } else {
                p.tile_queue = Some(TileQueue {
                    source: source.to_string(),
                    items: tiles.into(),
                });
            }
        })
    }

    fn update_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, queue: Option<TileQueue>) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.tile_queue = queue)
    }

    fn update_pending_tile_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingTileSelection>,
    ) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.pending_tile_selection = selection)
    }

    fn update_pending_card_draw_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingCardDrawSelection>,
    ) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.pending_card_draw_selection = selection)
    }

    fn update_forced_first_action(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        action: Option<ForcedFirstAction>,
    ) -> Result<()> {
        self.with_player(game_id, player_id, |p| p.forced_first_action = action)
    }
}

/// Card catalog held in memory
///
/// Cards keep their catalog order; lookups go through an id index.
#[derive(Debug, Default)]
pub struct InMemoryCardRepository {
    cards: Vec<Card>,
    index: FxHashMap<CardId, usize>,
}

impl InMemoryCardRepository {
    pub fn new(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut repo = InMemoryCardRepository::default();
        for card in cards {
            repo.add(card);
        }
        repo
    }

    /// Add a card, replacing any card with the same id
    pub fn add(&mut self, card: Card) {
        if let Some(&pos) = self.index.get(&card.id) {
            self.cards[pos] = card;
        } else {
            self.index.insert(card.id.clone(), self.cards.len());
            self.cards.push(card);
        }
    }

    /// Parse a JSON array of cards
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cards: Vec<Card> = serde_json::from_str(json)?;
        Ok(Self::new(cards))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Card catalog not found: {path:?}"),
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let repo = Self::from_json_str(&contents)?;
        tracing::info!(cards = repo.len(), path = %path.display(), "loaded card catalog");
        Ok(repo)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl CardRepository for InMemoryCardRepository {
    fn get_card_by_id(&self, card_id: &CardId) -> Result<Card> {
        self.index
            .get(card_id)
            .map(|&pos| self.cards[pos].clone())
            .ok_or_else(|| EngineError::CardNotFound(card_id.clone()))
    }

    fn get_starting_card_pool(&self) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|c| !matches!(c.card_type, CardType::Corporation | CardType::Prelude))
            .cloned()
            .collect())
    }

    fn get_corporations(&self) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|c| c.card_type == CardType::Corporation)
            .cloned()
            .collect())
    }
}

/// Seeded, shuffled project decks, one per game
#[derive(Default)]
pub struct InMemoryCardDeck {
    decks: RwLock<FxHashMap<GameId, Vec<CardId>>>,
}

impl InMemoryCardDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffle `cards` with a seeded RNG and install them as the game's deck
    pub fn initialize(&self, game_id: &GameId, mut cards: Vec<CardId>, seed: u64) -> Result<()> {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        cards.shuffle(&mut rng);
        let mut decks = self.decks.write().map_err(|_| EngineError::LockPoisoned)?;
        decks.insert(game_id.clone(), cards);
        Ok(())
    }

    /// Install an already-ordered deck (top of deck is the first element)
    pub fn set_ordered(&self, game_id: &GameId, mut cards: Vec<CardId>) -> Result<()> {
        cards.reverse();
        let mut decks = self.decks.write().map_err(|_| EngineError::LockPoisoned)?;
        decks.insert(game_id.clone(), cards);
        Ok(())
    }

    pub fn remaining(&self, game_id: &GameId) -> usize {
        self.decks
            .read()
            .map(|d| d.get(game_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl CardDeckRepository for InMemoryCardDeck {
    fn draw_project_cards(&self, game_id: &GameId, count: u32) -> Result<Vec<CardId>> {
        let mut decks = self.decks.write().map_err(|_| EngineError::LockPoisoned)?;
        let deck = decks
            .get_mut(game_id)
            .ok_or_else(|| EngineError::GameNotFound(game_id.clone()))?;
        let mut drawn = Vec::with_capacity((count as usize).min(deck.len()));
        for _ in 0..count {
            match deck.pop() {
                Some(card) => drawn.push(card),
                None => {
                    tracing::warn!(game_id = %game_id, requested = count, drawn = drawn.len(), "project deck exhausted");
                    break;
                }
            }
        }
        Ok(drawn)
    }
}
