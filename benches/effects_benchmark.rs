//! Performance benchmarks for card effect application
//!
//! Measures the two hot paths of the engine using Criterion.rs:
//!
//! 1. **Apply** - build and commit the effect plan of a played card
//! 2. **Dispatch** - publish a tile event to many subscribed passive effects

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::sync::Arc;
use terraform_engine::{
    board::{Board, HexCoord},
    core::{
        Behavior, Card, CardType, Game, GameId, Player, PlayerId, ResourceCondition, Target, TileKind,
        TriggerCondition, TriggerConditionKind,
    },
    events::{DomainEvent, TilePlaced},
    game::{CardProcessor, EffectSubscriber, EngineContext},
    repository::{InMemoryCardDeck, InMemoryCardRepository, InMemoryGameRepository, InMemoryPlayerRepository},
    RulesConfig,
};

const PLAYERS: usize = 4;

fn context() -> EngineContext {
    let game_id = GameId::new("bench");
    let player_ids: Vec<PlayerId> = (0..PLAYERS).map(|i| PlayerId::new(format!("p{i}"))).collect();

    let games = InMemoryGameRepository::new();
    games
        .insert(Game::new("bench", Board::hexagon(4)).with_players(player_ids.clone()))
        .expect("insert game");
    let players = InMemoryPlayerRepository::new();
    for id in &player_ids {
        players
            .insert(&game_id, Player::new(id.clone(), id.to_string()))
            .expect("insert player");
    }

    EngineContext::new(
        Arc::new(games),
        Arc::new(players),
        Arc::new(InMemoryCardRepository::default()),
        Arc::new(InMemoryCardDeck::new()),
        Arc::new(RulesConfig::default()),
    )
}

/// A card touching every commit step
fn busy_card() -> Card {
    Card::new("BUSY", "Busy Card", CardType::Active, 20)
        .with_behavior(Behavior::immediate(vec![
            ResourceCondition::new("energy-production", 1),
            ResourceCondition::new("credits", 3),
            ResourceCondition::new("temperature", 1),
            ResourceCondition::new("microbes", 1),
        ]))
        .with_behavior(Behavior::manual(
            vec![ResourceCondition::new("energy", 1)],
            vec![ResourceCondition::new("heat", 2)],
        ))
        .with_behavior(Behavior::passive(
            TriggerCondition::new(TriggerConditionKind::CityPlaced),
            vec![ResourceCondition::new("credits", 1).with_target(Target::SelfPlayer)],
        ))
}

fn bench_apply_card(c: &mut Criterion) {
    let mut group = c.benchmark_group("card_effects");
    let card = busy_card();
    let game_id = GameId::new("bench");
    let player_id = PlayerId::new("p0");

    group.bench_function("plan", |b| {
        let ctx = context();
        let processor = CardProcessor::new(ctx.clone(), Arc::new(EffectSubscriber::new(ctx.clone())));
        let player = ctx.player(&game_id, &player_id).expect("player");
        b.iter(|| {
            processor
                .plan_card_effects(&game_id, black_box(&player), &card, None, None)
                .expect("plan")
        });
    });

    group.bench_function("apply", |b| {
        b.iter_batched(
            || {
                let ctx = context();
                let subscriber = Arc::new(EffectSubscriber::new(ctx.clone()));
                (ctx.clone(), CardProcessor::new(ctx, subscriber))
            },
            |(ctx, processor)| {
                processor
                    .apply_card_effects(&game_id, &player_id, black_box(&card), None, None)
                    .expect("apply");
                ctx.bus.clear().expect("clear")
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_passive_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("passive_dispatch");
    let game_id = GameId::new("bench");

    for subscribers in [1usize, 16, 64] {
        let ctx = context();
        let subscriber = EffectSubscriber::new(ctx.clone());
        for i in 0..subscribers {
            let owner = PlayerId::new(format!("p{}", i % PLAYERS));
            let card = Card::new(format!("ROVER-{i}"), "Rover", CardType::Active, 8).with_behavior(
                Behavior::passive(
                    TriggerCondition::new(TriggerConditionKind::CityPlaced),
                    vec![ResourceCondition::new("credits", 2).with_target(Target::SelfPlayer)],
                ),
            );
            subscriber.subscribe(&game_id, &owner, &card).expect("subscribe");
        }

        let event = DomainEvent::TilePlaced(TilePlaced {
            game_id: game_id.clone(),
            player_id: PlayerId::new("p0"),
            tile: TileKind::City,
            coord: HexCoord::new(0, 0),
            source: None,
        });

        group.bench_with_input(BenchmarkId::new("city_placed", subscribers), &event, |b, event| {
            b.iter(|| ctx.bus.publish(black_box(event.clone())).expect("publish"));
        });

        subscriber.unsubscribe_all().expect("unsubscribe");
    }

    group.finish();
}

criterion_group!(benches, bench_apply_card, bench_passive_dispatch);
criterion_main!(benches);
