//! Passive effect subscriptions
//!
//! A passive effect is an auto behavior with a trigger condition. When its
//! card is played the effect is bound to the session's event bus; every
//! matching event re-applies the behavior's outputs to the owning player.
//!
//! The card → subscription table is owned by the session, not shared
//! process-wide, and is emptied when the session shuts down.

use crate::core::{
    BehaviorShape, Card, CardId, GameId, PlayerEffect, PlayerId, ResourceCondition, ResourceKind,
    Target, TileKind, TriggerCondition, TriggerConditionKind,
};
use crate::events::{DomainEvent, EventKind, SubscriptionId};
use crate::game::plan::{EffectPlan, OutputScope};
use crate::game::EngineContext;
use crate::{EngineError, Result};
use rustc_hash::FxHashMap;
use std::sync::Mutex;

pub struct EffectSubscriber {
    ctx: EngineContext,
    subscriptions: Mutex<FxHashMap<CardId, Vec<SubscriptionId>>>,
}

impl EffectSubscriber {
    pub fn new(ctx: EngineContext) -> Self {
        EffectSubscriber {
            ctx,
            subscriptions: Mutex::new(FxHashMap::default()),
        }
    }

    /// Subscribe every passive behavior of `card` for `player_id`
    ///
    /// Returns the number of subscriptions created.
    pub fn subscribe(&self, game_id: &GameId, player_id: &PlayerId, card: &Card) -> Result<usize> {
        let mut created = 0;
        for (index, behavior) in card.behaviors_with_shape(BehaviorShape::Passive) {
            let effect = PlayerEffect::new(card.id.clone(), card.name.clone(), index, behavior.clone());
            if self.subscribe_effect(game_id, player_id, &effect)?.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Bind one passive effect to the bus
    ///
    /// Returns `None` when the trigger condition names no known event.
    pub fn subscribe_effect(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        effect: &PlayerEffect,
    ) -> Result<Option<SubscriptionId>> {
        let Some(condition) = effect.behavior.condition().cloned() else {
            return Ok(None);
        };
        let Some(kind) = event_kind_for(&condition.kind) else {
            tracing::debug!(
                card_id = %effect.card_id,
                condition = condition.kind.as_str(),
                "trigger condition has no event, not subscribed"
            );
            return Ok(None);
        };

        let ctx = self.ctx.clone();
        let game = game_id.clone();
        let owner = player_id.clone();
        let bound = effect.clone();
        let id = self.ctx.bus.subscribe(kind, move |event| {
            if !event_matches(&condition, event, &game) {
                return Ok(());
            }
            tracing::debug!(
                game_id = %game,
                player_id = %owner,
                card_id = %bound.card_id,
                condition = condition.kind.as_str(),
                "passive effect triggered"
            );
            apply_passive_outputs(&ctx, &game, &owner, &bound, event)
        })?;

        let mut table = self.subscriptions.lock().map_err(|_| EngineError::LockPoisoned)?;
        table.entry(effect.card_id.clone()).or_default().push(id);
        tracing::debug!(
            game_id = %game_id,
            player_id = %player_id,
            card_id = %effect.card_id,
            subscription = %id,
            ?kind,
            "passive effect subscribed"
        );
        Ok(Some(id))
    }

    /// Remove every subscription of a card; no-op if it has none
    pub fn unsubscribe(&self, card_id: &CardId) -> Result<()> {
        let ids = {
            let mut table = self.subscriptions.lock().map_err(|_| EngineError::LockPoisoned)?;
            table.remove(card_id).unwrap_or_default()
        };
        for id in &ids {
            self.ctx.bus.unsubscribe(*id)?;
        }
        if !ids.is_empty() {
            tracing::debug!(card_id = %card_id, removed = ids.len(), "passive effects unsubscribed");
        }
        Ok(())
    }

    pub fn unsubscribe_all(&self) -> Result<usize> {
        let table = {
            let mut table = self.subscriptions.lock().map_err(|_| EngineError::LockPoisoned)?;
            std::mem::take(&mut *table)
        };
        let mut removed = 0;
        for id in table.values().flatten() {
            if self.ctx.bus.unsubscribe(*id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn subscription_count(&self, card_id: &CardId) -> usize {
        self.subscriptions
            .lock()
            .map(|t| t.get(card_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

fn event_kind_for(condition: &TriggerConditionKind) -> Option<EventKind> {
    match condition {
        TriggerConditionKind::TemperatureRaise => Some(EventKind::TemperatureChanged),
        TriggerConditionKind::OxygenRaise => Some(EventKind::OxygenChanged),
        TriggerConditionKind::OceanPlaced => Some(EventKind::OceansChanged),
        TriggerConditionKind::CityPlaced
        | TriggerConditionKind::GreeneryPlaced
        | TriggerConditionKind::TilePlaced => Some(EventKind::TilePlaced),
        TriggerConditionKind::CardPlayed | TriggerConditionKind::TagPlayed => Some(EventKind::CardPlayed),
        TriggerConditionKind::PlacementBonusGained => Some(EventKind::PlacementBonusGained),
        TriggerConditionKind::Unknown(_) => None,
    }
}

/// Same game, and the event satisfies the condition's filter
fn event_matches(condition: &TriggerCondition, event: &DomainEvent, game_id: &GameId) -> bool {
    if event.game_id() != game_id {
        return false;
    }
    match (&condition.kind, event) {
        (TriggerConditionKind::TemperatureRaise, DomainEvent::TemperatureChanged(e))
        | (TriggerConditionKind::OxygenRaise, DomainEvent::OxygenChanged(e))
        | (TriggerConditionKind::OceanPlaced, DomainEvent::OceansChanged(e)) => e.is_raise(),
        (TriggerConditionKind::CityPlaced, DomainEvent::TilePlaced(e)) => e.tile == TileKind::City,
        (TriggerConditionKind::GreeneryPlaced, DomainEvent::TilePlaced(e)) => e.tile == TileKind::Greenery,
        (TriggerConditionKind::TilePlaced, DomainEvent::TilePlaced(_)) => true,
        (TriggerConditionKind::CardPlayed, DomainEvent::CardPlayed(e)) => {
            condition.affected_tags.is_empty() || e.tags.iter().any(|t| condition.affected_tags.contains(t))
        }
        (TriggerConditionKind::TagPlayed, DomainEvent::CardPlayed(e)) => {
            if condition.affected_tags.is_empty() {
                !e.tags.is_empty()
            } else {
                e.tags.iter().any(|t| condition.affected_tags.contains(t))
            }
        }
        (TriggerConditionKind::PlacementBonusGained, DomainEvent::PlacementBonusGained(e)) => {
            condition.affected_resources.is_empty()
                || condition.affected_resources.iter().any(|kind| match kind {
                    ResourceKind::Resource(r) => e.resources.get(*r) > 0,
                    _ => false,
                })
        }
        _ => false,
    }
}

/// Self-player outputs only apply when the subscriber caused the event
fn applies_to_subscriber(output: &ResourceCondition, subscriber: &PlayerId, event: &DomainEvent) -> bool {
    match output.target {
        Some(Target::SelfPlayer) => event.originating_player().map_or(true, |p| p == subscriber),
        _ => true,
    }
}

/// Apply a passive behavior's outputs after a matching event
///
/// Only production, resources, terraform rating, card storage and global
/// parameters apply here; other kinds are skipped.
fn apply_passive_outputs(
    ctx: &EngineContext,
    game_id: &GameId,
    player_id: &PlayerId,
    effect: &PlayerEffect,
    event: &DomainEvent,
) -> Result<()> {
    let player = ctx.players.get_by_id(game_id, player_id)?;
    let scope = OutputScope {
        self_card: &effect.card_id,
        played_cards: &player.played_cards,
        storage_target: None,
    };

    let mut plan = EffectPlan::new(game_id.clone(), player_id.clone(), effect.card_id.clone());
    for output in &effect.behavior.outputs {
        if !applies_to_subscriber(output, player_id, event) {
            tracing::trace!(card_id = %effect.card_id, kind = %output.kind, "output targets the event's player only");
            continue;
        }
        match &output.kind {
            ResourceKind::Production(_)
            | ResourceKind::Resource(_)
            | ResourceKind::TerraformRating
            | ResourceKind::CardStorage(_)
            | ResourceKind::GlobalParameter(_) => plan.add_output(output, &scope)?,
            other => {
                tracing::debug!(card_id = %effect.card_id, kind = %other, "output kind not applied by passive effects");
            }
        }
    }

    if plan.is_empty() {
        return Ok(());
    }
    plan.commit(ctx, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::HexCoord;
    use crate::core::{CardType, Tag};
    use crate::events::{CardPlayed, ParameterChanged, TilePlaced};

    fn game() -> GameId {
        GameId::new("g1")
    }

    fn tile(tile: TileKind, game: &str) -> DomainEvent {
        DomainEvent::TilePlaced(TilePlaced {
            game_id: GameId::new(game),
            player_id: PlayerId::new("p2"),
            tile,
            coord: HexCoord::new(0, 0),
            source: None,
        })
    }

    fn card_played(tags: Vec<Tag>) -> DomainEvent {
        DomainEvent::CardPlayed(CardPlayed {
            game_id: game(),
            player_id: PlayerId::new("p1"),
            card_id: CardId::new("X"),
            card_name: "X".to_string(),
            card_type: CardType::Automated,
            tags,
        })
    }

    #[test]
    fn test_tile_conditions_filter_by_tile_and_game() {
        let city = TriggerCondition::new(TriggerConditionKind::CityPlaced);
        assert!(event_matches(&city, &tile(TileKind::City, "g1"), &game()));
        assert!(!event_matches(&city, &tile(TileKind::Greenery, "g1"), &game()));
        assert!(!event_matches(&city, &tile(TileKind::City, "other"), &game()));

        let any = TriggerCondition::new(TriggerConditionKind::TilePlaced);
        assert!(event_matches(&any, &tile(TileKind::Ocean, "g1"), &game()));
    }

    #[test]
    fn test_raise_conditions_ignore_decreases() {
        let condition = TriggerCondition::new(TriggerConditionKind::TemperatureRaise);
        let raise = DomainEvent::TemperatureChanged(ParameterChanged {
            game_id: game(),
            old_value: -30,
            new_value: -28,
        });
        let drop = DomainEvent::TemperatureChanged(ParameterChanged {
            game_id: game(),
            old_value: -28,
            new_value: -30,
        });
        assert!(event_matches(&condition, &raise, &game()));
        assert!(!event_matches(&condition, &drop, &game()));
    }

    #[test]
    fn test_tag_played_filter() {
        let mut condition = TriggerCondition::new(TriggerConditionKind::TagPlayed);
        condition.affected_tags = vec![Tag::Science];
        assert!(event_matches(&condition, &card_played(vec![Tag::Building, Tag::Science]), &game()));
        assert!(!event_matches(&condition, &card_played(vec![Tag::Building]), &game()));

        let untagged = TriggerCondition::new(TriggerConditionKind::TagPlayed);
        assert!(!event_matches(&untagged, &card_played(vec![]), &game()));
    }

    #[test]
    fn test_self_player_outputs_follow_event_player() {
        let mine = ResourceCondition::new("credits", 2).with_target(Target::SelfPlayer);
        let anyone = ResourceCondition::new("steel", 1);
        let event = tile(TileKind::City, "g1");

        assert!(applies_to_subscriber(&mine, &PlayerId::new("p2"), &event));
        assert!(!applies_to_subscriber(&mine, &PlayerId::new("p1"), &event));
        assert!(applies_to_subscriber(&anyone, &PlayerId::new("p1"), &event));

        // Parameter events carry no player: self-player outputs apply
        let raise = DomainEvent::OxygenChanged(ParameterChanged {
            game_id: game(),
            old_value: 1,
            new_value: 2,
        });
        assert!(applies_to_subscriber(&mine, &PlayerId::new("p1"), &raise));
    }

    #[test]
    fn test_unknown_conditions_have_no_event() {
        assert_eq!(event_kind_for(&TriggerConditionKind::from("venus-raise".to_string())), None);
        assert_eq!(
            event_kind_for(&TriggerConditionKind::OceanPlaced),
            Some(EventKind::OceansChanged)
        );
    }
}
