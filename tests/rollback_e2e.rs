//! Failed writes leave no partial card play behind
//!
//! `FlakyPlayers` wraps the in-memory repository and fails victory point
//! writes on demand, which lands after production and effects are written.
//! `FlakyGames` fails temperature writes, which land after every player
//! record write.

use rustc_hash::FxHashMap;
use similar_asserts::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use terraform_engine::{
    board::{Board, HexCoord},
    core::{
        Behavior, Card, CardId, CardType, ForcedFirstAction, Game, GameId, GamePhase, PendingCardDrawSelection,
        PendingTileSelection, Player, PlayerAction, PlayerEffect, PlayerId, ResourceCondition, ResourceSet, Tag,
        Target, TileKind, TileQueue, TriggerCondition, TriggerConditionKind, VpCondition,
    },
    game::{CardPayment, EngineContext, PlayCardRequest},
    repository::{
        GameRepository, InMemoryCardDeck, InMemoryCardRepository, InMemoryGameRepository, InMemoryPlayerRepository,
        PlayerRepository,
    },
    EngineError, GameSession, Result, RulesConfig,
};

struct FlakyPlayers {
    inner: InMemoryPlayerRepository,
    fail_victory_points: AtomicBool,
}

impl PlayerRepository for FlakyPlayers {
    fn get_by_id(&self, game_id: &GameId, player_id: &PlayerId) -> Result<Player> {
        self.inner.get_by_id(game_id, player_id)
    }

    fn list_players(&self, game_id: &GameId) -> Result<Vec<Player>> {
        self.inner.list_players(game_id)
    }

    fn update_resources(&self, game_id: &GameId, player_id: &PlayerId, resources: ResourceSet) -> Result<()> {
        self.inner.update_resources(game_id, player_id, resources)
    }

    fn update_production(&self, game_id: &GameId, player_id: &PlayerId, production: ResourceSet) -> Result<()> {
        self.inner.update_production(game_id, player_id, production)
    }

    fn update_resource_storage(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        storage: FxHashMap<CardId, i32>,
    ) -> Result<()> {
        self.inner.update_resource_storage(game_id, player_id, storage)
    }

    fn update_player_actions(&self, game_id: &GameId, player_id: &PlayerId, actions: Vec<PlayerAction>) -> Result<()> {
        self.inner.update_player_actions(game_id, player_id, actions)
    }

    fn update_player_effects(&self, game_id: &GameId, player_id: &PlayerId, effects: Vec<PlayerEffect>) -> Result<()> {
        self.inner.update_player_effects(game_id, player_id, effects)
    }

    fn update_terraform_rating(&self, game_id: &GameId, player_id: &PlayerId, rating: i32) -> Result<()> {
        self.inner.update_terraform_rating(game_id, player_id, rating)
    }

    fn update_victory_points(&self, game_id: &GameId, player_id: &PlayerId, points: i32) -> Result<()> {
        if self.fail_victory_points.load(Ordering::SeqCst) {
            return Err(EngineError::IoError(std::io::Error::other("player store unavailable")));
        }
        self.inner.update_victory_points(game_id, player_id, points)
    }

    fn update_corporation(&self, game_id: &GameId, player_id: &PlayerId, corporation: Option<CardId>) -> Result<()> {
        self.inner.update_corporation(game_id, player_id, corporation)
    }

    fn update_hand(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()> {
        self.inner.update_hand(game_id, player_id, cards)
    }

    fn update_played_cards(&self, game_id: &GameId, player_id: &PlayerId, cards: Vec<CardId>) -> Result<()> {
        self.inner.update_played_cards(game_id, player_id, cards)
    }

    fn create_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, source: &str, tiles: Vec<TileKind>) -> Result<()> {
        self.inner.create_tile_queue(game_id, player_id, source, tiles)
    }

    fn update_tile_queue(&self, game_id: &GameId, player_id: &PlayerId, queue: Option<TileQueue>) -> Result<()> {
        self.inner.update_tile_queue(game_id, player_id, queue)
    }

    fn update_pending_tile_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingTileSelection>,
    ) -> Result<()> {
        self.inner.update_pending_tile_selection(game_id, player_id, selection)
    }

    fn update_pending_card_draw_selection(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        selection: Option<PendingCardDrawSelection>,
    ) -> Result<()> {
        self.inner.update_pending_card_draw_selection(game_id, player_id, selection)
    }

    fn update_forced_first_action(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        action: Option<ForcedFirstAction>,
    ) -> Result<()> {
        self.inner.update_forced_first_action(game_id, player_id, action)
    }
}

struct FlakyGames {
    inner: InMemoryGameRepository,
    fail_temperature: AtomicBool,
}

impl GameRepository for FlakyGames {
    fn get_by_id(&self, game_id: &GameId) -> Result<Game> {
        self.inner.get_by_id(game_id)
    }

    fn update_temperature(&self, game_id: &GameId, value: i32) -> Result<()> {
        if self.fail_temperature.load(Ordering::SeqCst) {
            return Err(EngineError::IoError(std::io::Error::other("game store unavailable")));
        }
        self.inner.update_temperature(game_id, value)
    }

    fn update_oxygen(&self, game_id: &GameId, value: i32) -> Result<()> {
        self.inner.update_oxygen(game_id, value)
    }

    fn update_oceans(&self, game_id: &GameId, value: i32) -> Result<()> {
        self.inner.update_oceans(game_id, value)
    }

    fn update_phase(&self, game_id: &GameId, phase: GamePhase) -> Result<()> {
        self.inner.update_phase(game_id, phase)
    }

    fn update_current_turn(&self, game_id: &GameId, player_id: Option<PlayerId>) -> Result<()> {
        self.inner.update_current_turn(game_id, player_id)
    }

    fn update_generation(&self, game_id: &GameId, generation: u32) -> Result<()> {
        self.inner.update_generation(game_id, generation)
    }

    fn place_tile(
        &self,
        game_id: &GameId,
        coord: HexCoord,
        tile: TileKind,
        owner: Option<PlayerId>,
    ) -> Result<ResourceSet> {
        self.inner.place_tile(game_id, coord, tile, owner)
    }
}

fn game_id() -> GameId {
    GameId::new("g1")
}

fn alice() -> PlayerId {
    PlayerId::new("alice")
}

/// Production, a passive effect and a victory point in one card
fn power_rover() -> Card {
    Card::new("PWR", "Power Rover", CardType::Active, 10)
        .with_tags([Tag::Power])
        .with_behavior(Behavior::immediate(vec![ResourceCondition::new("energy-production", 2)]))
        .with_behavior(Behavior::passive(
            TriggerCondition::new(TriggerConditionKind::CityPlaced),
            vec![ResourceCondition::new("credits", 2).with_target(Target::SelfPlayer)],
        ))
        .with_vp(VpCondition::fixed(1))
}

fn setup() -> Result<(GameSession, Arc<FlakyPlayers>)> {
    let games = InMemoryGameRepository::new();
    games.insert(Game::new("g1", Board::hexagon(1)).with_players([alice()]))?;

    let inner = InMemoryPlayerRepository::new();
    inner.insert(
        &game_id(),
        Player::new(alice(), "Alice")
            .with_resources(ResourceSet {
                credits: 30,
                ..ResourceSet::default()
            })
            .with_production(ResourceSet {
                energy: 1,
                ..ResourceSet::default()
            })
            .with_hand([CardId::new("PWR")]),
    )?;
    let players = Arc::new(FlakyPlayers {
        inner,
        fail_victory_points: AtomicBool::new(true),
    });

    let ctx = EngineContext::new(
        Arc::new(games),
        players.clone(),
        Arc::new(InMemoryCardRepository::new([power_rover()])),
        Arc::new(InMemoryCardDeck::new()),
        Arc::new(RulesConfig::default()),
    );
    Ok((GameSession::new(ctx, game_id())?, players))
}

#[test]
fn test_failed_write_restores_player_record() -> Result<()> {
    let (session, players) = setup()?;
    let before = session.context().player(&game_id(), &alice())?;
    let subscriptions_before = session.context().bus.subscription_count();

    let err = session
        .play_card(&alice(), &PlayCardRequest::new("PWR", CardPayment::credits(10)))
        .unwrap_err();
    assert!(matches!(err, EngineError::IoError(_)));

    let after = session.context().player(&game_id(), &alice())?;
    assert_eq!(after, before);
    assert_eq!(after.production.energy, 1);
    assert!(after.effects.is_empty());
    assert!(after.has_in_hand(&CardId::new("PWR")));

    // The passive effect's subscription was dropped with the rest
    assert_eq!(session.subscriber().subscription_count(&CardId::new("PWR")), 0);
    assert_eq!(session.context().bus.subscription_count(), subscriptions_before);

    // The same play goes through once the store recovers
    players.fail_victory_points.store(false, Ordering::SeqCst);
    session.play_card(&alice(), &PlayCardRequest::new("PWR", CardPayment::credits(10)))?;
    let played = session.context().player(&game_id(), &alice())?;
    assert_eq!(played.production.energy, 3);
    assert_eq!(played.victory_points, 1);
    assert_eq!(played.resources.credits, 20);
    assert_eq!(session.subscriber().subscription_count(&CardId::new("PWR")), 1);
    Ok(())
}

/// Draws two cards and warms the planet
fn survey() -> Card {
    Card::new("SURVEY", "Thermal Survey", CardType::Event, 0).with_behavior(Behavior::immediate(vec![
        ResourceCondition::new("card-draw", 2),
        ResourceCondition::new("temperature", 1),
    ]))
}

fn setup_with_deck() -> Result<(GameSession, Arc<FlakyGames>, Arc<InMemoryCardDeck>)> {
    let inner = InMemoryGameRepository::new();
    inner.insert(Game::new("g1", Board::hexagon(1)).with_players([alice()]))?;
    let games = Arc::new(FlakyGames {
        inner,
        fail_temperature: AtomicBool::new(true),
    });

    let players = InMemoryPlayerRepository::new();
    players.insert(&game_id(), Player::new(alice(), "Alice").with_hand([CardId::new("SURVEY")]))?;

    let deck = Arc::new(InMemoryCardDeck::new());
    deck.set_ordered(&game_id(), vec![CardId::new("D1"), CardId::new("D2"), CardId::new("D3")])?;

    let ctx = EngineContext::new(
        games.clone(),
        Arc::new(players),
        Arc::new(InMemoryCardRepository::new([survey()])),
        deck.clone(),
        Arc::new(RulesConfig::default()),
    );
    Ok((GameSession::new(ctx, game_id())?, games, deck))
}

#[test]
fn test_failed_parameter_write_keeps_deck_intact() -> Result<()> {
    let (session, games, deck) = setup_with_deck()?;
    let before = session.context().player(&game_id(), &alice())?;
    let temperature = session.context().game(&game_id())?.global_parameters.temperature;

    let err = session
        .play_card(&alice(), &PlayCardRequest::new("SURVEY", CardPayment::default()))
        .unwrap_err();
    assert!(matches!(err, EngineError::IoError(_)));

    assert_eq!(deck.remaining(&game_id()), 3);
    let after = session.context().player(&game_id(), &alice())?;
    assert_eq!(after, before);
    assert!(after.pending_card_draw_selection.is_none());
    assert!(after.has_in_hand(&CardId::new("SURVEY")));
    assert_eq!(session.context().game(&game_id())?.global_parameters.temperature, temperature);

    games.fail_temperature.store(false, Ordering::SeqCst);
    session.play_card(&alice(), &PlayCardRequest::new("SURVEY", CardPayment::default()))?;
    assert_eq!(deck.remaining(&game_id()), 1);
    let selection = session
        .context()
        .player(&game_id(), &alice())?
        .pending_card_draw_selection
        .expect("draw selection pending");
    assert_eq!(selection.available_cards, vec![CardId::new("D1"), CardId::new("D2")]);
    assert_eq!(
        session.context().game(&game_id())?.global_parameters.temperature,
        temperature + 2
    );
    Ok(())
}
