//! Per-game sessions
//!
//! A [`GameSession`] owns everything that lives as long as one game: the
//! event bus, the passive-effect subscription table and the services that
//! drive card play. Ending the session (explicitly or by dropping it) tears
//! the subscriptions down again.
//!
//! [`SessionRegistry`] hands out sessions behind an async mutex, so all
//! operations on one game are serialized while different games run in
//! parallel.

use crate::board::HexCoord;
use crate::config::RulesConfig;
use crate::core::{CardId, GameId, GamePhase, PlayerId, ResourceSet};
use crate::events::{DomainEvent, PhaseChanged};
use crate::game::{
    CardActionService, CardManager, CardProcessor, CorporationService, EffectSubscriber, EngineContext,
    ForcedActionManager, PlayCardRequest, SelectionService, TileService,
};
use crate::repository::{CardDeckRepository, CardRepository, GameRepository, PlayerRepository};
use crate::Result;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct GameSession {
    game_id: GameId,
    ctx: EngineContext,
    subscriber: Arc<EffectSubscriber>,
    processor: Arc<CardProcessor>,
    cards: CardManager,
    actions: CardActionService,
    corporations: CorporationService,
    tiles: TileService,
    selections: SelectionService,
    forced: Arc<ForcedActionManager>,
    closed: bool,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("game_id", &self.game_id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Wire the engine services for `game_id`
    ///
    /// The session takes over `ctx`'s event bus; it is cleared on shutdown.
    pub fn new(ctx: EngineContext, game_id: GameId) -> Result<Self> {
        // Fail fast on an unknown game
        ctx.games.get_by_id(&game_id)?;

        let subscriber = Arc::new(EffectSubscriber::new(ctx.clone()));
        let processor = Arc::new(CardProcessor::new(ctx.clone(), subscriber.clone()));
        let forced = ForcedActionManager::new(ctx.clone(), game_id.clone());
        forced.register()?;

        tracing::info!(game_id = %game_id, "game session opened");
        Ok(GameSession {
            cards: CardManager::new(ctx.clone(), processor.clone()),
            actions: CardActionService::new(ctx.clone(), subscriber.clone()),
            corporations: CorporationService::new(ctx.clone(), processor.clone()),
            tiles: TileService::new(ctx.clone()),
            selections: SelectionService::new(ctx.clone()),
            game_id,
            ctx,
            subscriber,
            processor,
            forced,
            closed: false,
        })
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn subscriber(&self) -> &Arc<EffectSubscriber> {
        &self.subscriber
    }

    pub fn processor(&self) -> &Arc<CardProcessor> {
        &self.processor
    }

    pub fn card_manager(&self) -> &CardManager {
        &self.cards
    }

    pub fn forced_actions(&self) -> &Arc<ForcedActionManager> {
        &self.forced
    }

    pub fn select_corporation(&self, player_id: &PlayerId, corporation_id: &CardId) -> Result<()> {
        self.corporations
            .select_corporation(&self.game_id, player_id, corporation_id)
    }

    pub fn can_play_card(&self, player_id: &PlayerId, request: &PlayCardRequest) -> Result<()> {
        self.cards.can_play(&self.game_id, player_id, request)
    }

    pub fn play_card(&self, player_id: &PlayerId, request: &PlayCardRequest) -> Result<()> {
        self.cards.play_card(&self.game_id, player_id, request)
    }

    pub fn play_card_action(
        &self,
        player_id: &PlayerId,
        card_id: &CardId,
        behavior_index: usize,
        choice: Option<usize>,
        storage_target: Option<&CardId>,
    ) -> Result<()> {
        self.actions
            .play_card_action(&self.game_id, player_id, card_id, behavior_index, choice, storage_target)
    }

    pub fn place_tile(&self, player_id: &PlayerId, coord: HexCoord) -> Result<ResourceSet> {
        self.tiles.place_tile(&self.game_id, player_id, coord)
    }

    pub fn confirm_card_draw(&self, player_id: &PlayerId, selected: &[CardId]) -> Result<()> {
        self.selections.confirm_card_draw(&self.game_id, player_id, selected)
    }

    pub fn set_current_turn(&self, player_id: Option<PlayerId>) -> Result<()> {
        self.ctx.games.update_current_turn(&self.game_id, player_id)
    }

    /// Move the game to `phase` and announce it on the bus
    pub fn set_phase(&self, phase: GamePhase) -> Result<()> {
        let old_phase = self.ctx.games.get_by_id(&self.game_id)?.phase;
        self.ctx.games.update_phase(&self.game_id, phase)?;
        tracing::info!(game_id = %self.game_id, from = %old_phase, to = %phase, "phase changed");
        self.ctx.bus.publish(DomainEvent::GamePhaseChanged(PhaseChanged {
            game_id: self.game_id.clone(),
            old_phase,
            new_phase: phase,
        }))?;
        Ok(())
    }

    /// Start the next generation: bump the counter and make every action
    /// usable again
    pub fn advance_generation(&self) -> Result<u32> {
        let generation = self.ctx.games.get_by_id(&self.game_id)?.generation + 1;
        self.ctx.games.update_generation(&self.game_id, generation)?;
        self.actions.reset_action_play_counts(&self.game_id)?;
        tracing::info!(game_id = %self.game_id, generation, "generation started");
        Ok(generation)
    }

    /// Drop every subscription owned by this game
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.forced.deregister()?;
        let effects = self.subscriber.unsubscribe_all()?;
        let remaining = self.ctx.bus.clear()?;
        tracing::info!(game_id = %self.game_id, effects, remaining, "game session closed");
        Ok(())
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(game_id = %self.game_id, error = %err, "session shutdown failed");
        }
    }
}

/// Open sessions keyed by game
pub struct SessionRegistry {
    games: Arc<dyn GameRepository>,
    players: Arc<dyn PlayerRepository>,
    cards: Arc<dyn CardRepository>,
    deck: Arc<dyn CardDeckRepository>,
    rules: Arc<RulesConfig>,
    sessions: Mutex<FxHashMap<GameId, Arc<Mutex<GameSession>>>>,
}

impl SessionRegistry {
    pub fn new(
        games: Arc<dyn GameRepository>,
        players: Arc<dyn PlayerRepository>,
        cards: Arc<dyn CardRepository>,
        deck: Arc<dyn CardDeckRepository>,
        rules: Arc<RulesConfig>,
    ) -> Self {
        SessionRegistry {
            games,
            players,
            cards,
            deck,
            rules,
            sessions: Mutex::new(FxHashMap::default()),
        }
    }

    /// Return the game's session, opening one if needed
    pub async fn open(&self, game_id: &GameId) -> Result<Arc<Mutex<GameSession>>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(game_id) {
            return Ok(session.clone());
        }

        let ctx = EngineContext::new(
            self.games.clone(),
            self.players.clone(),
            self.cards.clone(),
            self.deck.clone(),
            self.rules.clone(),
        );
        let session = Arc::new(Mutex::new(GameSession::new(ctx, game_id.clone())?));
        sessions.insert(game_id.clone(), session.clone());
        Ok(session)
    }

    pub async fn get(&self, game_id: &GameId) -> Option<Arc<Mutex<GameSession>>> {
        self.sessions.lock().await.get(game_id).cloned()
    }

    /// Remove and shut down the game's session; returns whether one was open
    pub async fn close(&self, game_id: &GameId) -> Result<bool> {
        let removed = self.sessions.lock().await.remove(game_id);
        match removed {
            Some(session) => {
                session.lock().await.shutdown()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
