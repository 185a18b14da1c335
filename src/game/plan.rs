//! Staged effect application
//!
//! Effects are applied in two phases. First an [`EffectPlan`] is built from
//! the behaviors being applied and a snapshot of the player; every
//! consistency check (storage targets, unsupported targets) happens here,
//! before anything is written. Then [`EffectPlan::commit`] writes the plan
//! in a fixed order:
//!
//! 1. production
//! 2. manual actions
//! 3. effects and their bus subscriptions
//! 4. victory points
//! 5. resources, terraform rating and card storage
//! 6. tile queue
//! 7. global parameters (clamped) and the terraform rating they award
//! 8. card draws, which take cards off the deck for good
//!
//! Each write is recorded in an [`UndoLog`]. If any write fails the log is
//! rewound, so a failed commit leaves no partial state. Parameter events are
//! published only once every write has succeeded.

use crate::core::{
    CardId, GameId, GlobalParameter, PendingCardDrawSelection, PlayerAction, PlayerEffect, PlayerId,
    ResourceCondition, ResourceKind, ResourceSet, StorageResource, Target, TileKind,
};
use crate::game::parameters::{apply_parameter_steps, publish_parameter_changes, ParameterChange};
use crate::game::requirements::charges_other_player;
use crate::game::subscriber::EffectSubscriber;
use crate::game::tiles::advance_tile_queue;
use crate::game::EngineContext;
use crate::undo::{StateChange, UndoLog};
use crate::{EngineError, Result};

/// Where card-storage outputs may land
#[derive(Debug, Clone, Copy)]
pub struct OutputScope<'a> {
    /// The card whose behavior is being applied
    pub self_card: &'a CardId,
    pub played_cards: &'a [CardId],
    /// Caller-chosen card for any-card storage outputs
    pub storage_target: Option<&'a CardId>,
}

/// Every delta one effect application will write
#[derive(Debug, Clone)]
pub struct EffectPlan {
    pub game_id: GameId,
    pub player_id: PlayerId,
    /// Card the effects come from; used as the source of queues and draws
    pub source: CardId,
    pub production: ResourceSet,
    pub actions: Vec<PlayerAction>,
    /// Manual action to mark as used this generation
    pub played_action: Option<(CardId, usize)>,
    pub effects: Vec<PlayerEffect>,
    pub victory_points: i32,
    pub resources: ResourceSet,
    pub terraform_rating: i32,
    pub storage: Vec<(CardId, i32)>,
    pub tiles: Vec<TileKind>,
    pub parameters: Vec<(GlobalParameter, i32)>,
    pub card_draw: u32,
}

impl EffectPlan {
    pub fn new(game_id: GameId, player_id: PlayerId, source: CardId) -> Self {
        EffectPlan {
            game_id,
            player_id,
            source,
            production: ResourceSet::default(),
            actions: Vec::new(),
            played_action: None,
            effects: Vec::new(),
            victory_points: 0,
            resources: ResourceSet::default(),
            terraform_rating: 0,
            storage: Vec::new(),
            tiles: Vec::new(),
            parameters: Vec::new(),
            card_draw: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.production.is_zero()
            && self.actions.is_empty()
            && self.played_action.is_none()
            && self.effects.is_empty()
            && self.victory_points == 0
            && self.resources.is_zero()
            && self.terraform_rating == 0
            && self.storage.is_empty()
            && self.tiles.is_empty()
            && self.parameters.iter().all(|(_, steps)| *steps == 0)
            && self.card_draw == 0
    }

    /// Sum steps per parameter, keeping first-seen order
    pub fn add_parameter_steps(&mut self, parameter: GlobalParameter, steps: i32) {
        match self.parameters.iter_mut().find(|(p, _)| *p == parameter) {
            Some((_, total)) => *total = total.saturating_add(steps),
            None => self.parameters.push((parameter, steps)),
        }
    }

    /// Stage a single output line item
    pub fn add_output(&mut self, output: &ResourceCondition, scope: &OutputScope<'_>) -> Result<()> {
        if charges_other_player(output) {
            tracing::debug!(
                card_id = %scope.self_card,
                kind = %output.kind,
                amount = output.amount,
                "reduction aimed at another player not applied"
            );
            return Ok(());
        }

        match &output.kind {
            ResourceKind::Production(resource) => self.production.add(*resource, output.amount),
            ResourceKind::Resource(resource) => self.resources.add(*resource, output.amount),
            ResourceKind::TerraformRating => self.terraform_rating += output.amount,
            ResourceKind::CardStorage(kind) => self.add_storage(output, *kind, scope)?,
            ResourceKind::TilePlacement(tile) => {
                for _ in 0..output.amount.max(0) {
                    self.tiles.push(*tile);
                }
            }
            ResourceKind::GlobalParameter(parameter) => self.add_parameter_steps(*parameter, output.amount),
            ResourceKind::CardDraw => self.card_draw = self.card_draw.saturating_add(output.amount.max(0) as u32),
            kind if kind.is_static_modifier() => {
                // Read from the player's effects by the validators
            }
            ResourceKind::Tile(_) | ResourceKind::CardTake | ResourceKind::CardPeek => {
                tracing::debug!(card_id = %scope.self_card, kind = %output.kind, "output kind not applied");
            }
            ResourceKind::Unknown(raw) => {
                tracing::debug!(card_id = %scope.self_card, kind = %raw, "unknown output kind, skipping");
            }
            _ => {}
        }
        Ok(())
    }

    /// Stage an input line item as a cost
    ///
    /// Base resources are debited from the pool, card-storage inputs from
    /// the source card (or the named card for any-card inputs).
    pub fn add_input(&mut self, input: &ResourceCondition, scope: &OutputScope<'_>) -> Result<()> {
        let mut cost = input.clone();
        cost.amount = -input.amount;
        match &input.kind {
            ResourceKind::Resource(_) | ResourceKind::Production(_) | ResourceKind::CardStorage(_) => {
                self.add_output(&cost, scope)
            }
            other => {
                tracing::debug!(card_id = %scope.self_card, kind = %other, "input kind not charged");
                Ok(())
            }
        }
    }

    fn add_storage(&mut self, output: &ResourceCondition, kind: StorageResource, scope: &OutputScope<'_>) -> Result<()> {
        let target = match output.target {
            Some(Target::SelfCard) | None => scope.self_card.clone(),
            Some(Target::AnyCard) => match scope.storage_target.filter(|c| !c.is_empty()) {
                None => {
                    tracing::info!(
                        card_id = %scope.self_card,
                        resource = kind.as_str(),
                        amount = output.amount,
                        "no storage target chosen, resource discarded"
                    );
                    return Ok(());
                }
                Some(target) if scope.played_cards.contains(target) => target.clone(),
                Some(target) => return Err(EngineError::StorageTargetNotFound(target.clone())),
            },
            Some(other) => {
                return Err(EngineError::Unsupported(format!(
                    "card storage output with target {other:?}"
                )));
            }
        };
        self.storage.push((target, output.amount));
        Ok(())
    }

    /// Write the plan, rolling back every write if one fails
    ///
    /// Passive effects in the plan are subscribed through `subscriber`.
    pub fn commit(&self, ctx: &EngineContext, subscriber: Option<&EffectSubscriber>) -> Result<()> {
        let mut log = UndoLog::new(self.game_id.clone());
        match self.write(ctx, subscriber, &mut log) {
            Ok(changes) => {
                tracing::debug!(
                    game_id = %self.game_id,
                    player_id = %self.player_id,
                    card_id = %self.source,
                    writes = log.len(),
                    "effects committed"
                );
                publish_parameter_changes(ctx, &self.game_id, &changes)
            }
            Err(err) => {
                tracing::warn!(
                    game_id = %self.game_id,
                    player_id = %self.player_id,
                    card_id = %self.source,
                    writes = log.len(),
                    error = %err,
                    "effect commit failed, rewinding"
                );
                let mut unsubscribe = |card: &CardId| match subscriber {
                    Some(s) => s.unsubscribe(card),
                    None => Ok(()),
                };
                if let Err(rewind_err) = log.rewind(ctx.games.as_ref(), ctx.players.as_ref(), &mut unsubscribe) {
                    tracing::error!(game_id = %self.game_id, error = %rewind_err, "rewind incomplete");
                }
                Err(err)
            }
        }
    }

    fn write(
        &self,
        ctx: &EngineContext,
        subscriber: Option<&EffectSubscriber>,
        log: &mut UndoLog,
    ) -> Result<Vec<ParameterChange>> {
        let game_id = &self.game_id;
        let player_id = &self.player_id;
        let player = ctx.players.get_by_id(game_id, player_id)?;

        if !self.production.is_zero() {
            let mut production = player.production;
            production.apply_delta(&self.production);
            log.log(StateChange::Production {
                player_id: player_id.clone(),
                previous: player.production,
            });
            ctx.players.update_production(game_id, player_id, production)?;
        }

        if !self.actions.is_empty() || self.played_action.is_some() {
            let mut actions = player.actions.clone();
            actions.extend(self.actions.iter().cloned());
            if let Some((card_id, index)) = &self.played_action {
                let action = actions
                    .iter_mut()
                    .find(|a| &a.card_id == card_id && a.behavior_index == *index)
                    .ok_or_else(|| {
                        EngineError::InvalidAction(format!("card {card_id} has no action at index {index}"))
                    })?;
                action.play_count += 1;
            }
            log.log(StateChange::Actions {
                player_id: player_id.clone(),
                previous: player.actions.clone(),
            });
            ctx.players.update_player_actions(game_id, player_id, actions)?;
        }

        if !self.effects.is_empty() {
            let mut effects = player.effects.clone();
            effects.extend(self.effects.iter().cloned());
            log.log(StateChange::Effects {
                player_id: player_id.clone(),
                previous: player.effects.clone(),
            });
            ctx.players.update_player_effects(game_id, player_id, effects)?;

            let passive: Vec<&PlayerEffect> = self.effects.iter().filter(|e| e.is_passive()).collect();
            match subscriber {
                Some(subscriber) if !passive.is_empty() => {
                    let mut logged: Vec<&CardId> = Vec::new();
                    for effect in passive {
                        if !logged.contains(&&effect.card_id) {
                            log.log(StateChange::Subscribed {
                                card_id: effect.card_id.clone(),
                            });
                            logged.push(&effect.card_id);
                        }
                        subscriber.subscribe_effect(game_id, player_id, effect)?;
                    }
                }
                None if !passive.is_empty() => {
                    tracing::warn!(
                        game_id = %game_id,
                        card_id = %self.source,
                        "passive effects recorded without a subscriber"
                    );
                }
                _ => {}
            }
        }

        if self.victory_points != 0 {
            log.log(StateChange::VictoryPoints {
                player_id: player_id.clone(),
                previous: player.victory_points,
            });
            ctx.players
                .update_victory_points(game_id, player_id, player.victory_points + self.victory_points)?;
        }

        if !self.resources.is_zero() {
            let mut resources = player.resources;
            resources.apply_delta(&self.resources);
            log.log(StateChange::Resources {
                player_id: player_id.clone(),
                previous: player.resources,
            });
            ctx.players.update_resources(game_id, player_id, resources)?;
        }

        if self.terraform_rating != 0 {
            log.log(StateChange::TerraformRating {
                player_id: player_id.clone(),
                previous: player.terraform_rating,
            });
            ctx.players
                .update_terraform_rating(game_id, player_id, player.terraform_rating + self.terraform_rating)?;
        }

        if !self.storage.is_empty() {
            let mut storage = player.resource_storage.clone();
            for (card_id, amount) in &self.storage {
                *storage.entry(card_id.clone()).or_insert(0) += amount;
            }
            log.log(StateChange::ResourceStorage {
                player_id: player_id.clone(),
                previous: player.resource_storage.clone(),
            });
            ctx.players.update_resource_storage(game_id, player_id, storage)?;
        }

        if !self.tiles.is_empty() {
            log.log(StateChange::TileQueue {
                player_id: player_id.clone(),
                previous: player.tile_queue.clone(),
                previous_selection: player.pending_tile_selection.clone(),
            });
            ctx.players
                .create_tile_queue(game_id, player_id, self.source.as_str(), self.tiles.clone())?;
            advance_tile_queue(ctx, game_id, player_id)?;
        }

        let changes = apply_parameter_steps(ctx, game_id, player_id, &self.parameters, log)?;

        // Drawn cards cannot be put back, so the draw follows every undoable write
        if self.card_draw > 0 {
            let drawn = ctx.deck.draw_project_cards(game_id, self.card_draw)?;
            let selection = match player.pending_card_draw_selection.clone() {
                Some(mut pending) => {
                    pending.available_cards.extend(drawn);
                    pending.free_take_count = pending.free_take_count.saturating_add(self.card_draw);
                    pending
                }
                None => PendingCardDrawSelection {
                    available_cards: drawn,
                    free_take_count: self.card_draw,
                    max_buy_count: 0,
                    card_buy_cost: 0,
                    source: self.source.to_string(),
                },
            };
            log.log(StateChange::CardDrawSelection {
                player_id: player_id.clone(),
                previous: player.pending_card_draw_selection.clone(),
            });
            ctx.players
                .update_pending_card_draw_selection(game_id, player_id, Some(selection))?;
        }

        Ok(changes)
    }
}
