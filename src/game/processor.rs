//! Card behavior interpreter
//!
//! Turns a played card's behaviors into player state: immediate outputs
//! are applied, manual behaviors become [`PlayerAction`]s, passive
//! behaviors become [`PlayerEffect`]s bound to the event bus, and fixed
//! victory points are awarded. Requirements and payment are checked before
//! this runs; nothing here re-validates affordability.

use crate::core::{
    BehaviorShape, Card, CardId, GameId, Player, PlayerAction, PlayerEffect, PlayerId, VpConditionKind,
};
use crate::game::plan::{EffectPlan, OutputScope};
use crate::game::subscriber::EffectSubscriber;
use crate::game::EngineContext;
use crate::Result;
use std::sync::Arc;

pub struct CardProcessor {
    ctx: EngineContext,
    subscriber: Arc<EffectSubscriber>,
}

impl CardProcessor {
    pub fn new(ctx: EngineContext, subscriber: Arc<EffectSubscriber>) -> Self {
        CardProcessor { ctx, subscriber }
    }

    pub fn subscriber(&self) -> &Arc<EffectSubscriber> {
        &self.subscriber
    }

    /// Apply every effect of `card` for the player, all or nothing
    pub fn apply_card_effects(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        card: &Card,
        choice: Option<usize>,
        storage_target: Option<&CardId>,
    ) -> Result<()> {
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let plan = self.plan_card_effects(game_id, &player, card, choice, storage_target)?;
        if plan.is_empty() {
            tracing::trace!(game_id = %game_id, card_id = %card.id, "card has no effects to apply");
            return Ok(());
        }

        plan.commit(&self.ctx, Some(&self.subscriber))?;
        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            card_id = %card.id,
            actions = plan.actions.len(),
            effects = plan.effects.len(),
            "card effects applied"
        );
        Ok(())
    }

    /// Stage a card's effects without writing anything
    ///
    /// Every consistency error (unknown storage target, unsupported target)
    /// is raised here.
    pub fn plan_card_effects(
        &self,
        game_id: &GameId,
        player: &Player,
        card: &Card,
        choice: Option<usize>,
        storage_target: Option<&CardId>,
    ) -> Result<EffectPlan> {
        let mut plan = EffectPlan::new(game_id.clone(), player.id.clone(), card.id.clone());
        let scope = OutputScope {
            self_card: &card.id,
            played_cards: &player.played_cards,
            storage_target,
        };

        for (index, behavior) in card.behaviors.iter().enumerate() {
            match behavior.shape() {
                BehaviorShape::Immediate => {
                    if behavior.has_static_modifiers() {
                        plan.effects.push(PlayerEffect::new(
                            card.id.clone(),
                            card.name.clone(),
                            index,
                            behavior.clone(),
                        ));
                    }
                    for output in behavior.outputs_with_choice(choice) {
                        plan.add_output(output, &scope)?;
                    }
                }
                BehaviorShape::Manual => {
                    plan.actions.push(PlayerAction::new(
                        card.id.clone(),
                        card.name.clone(),
                        index,
                        behavior.clone(),
                    ));
                }
                BehaviorShape::Passive => {
                    plan.effects.push(PlayerEffect::new(
                        card.id.clone(),
                        card.name.clone(),
                        index,
                        behavior.clone(),
                    ));
                }
                BehaviorShape::CorporationFirstAction | BehaviorShape::Inert => {}
            }
        }

        for vp in &card.vp_conditions {
            match &vp.condition {
                VpConditionKind::Fixed => plan.victory_points += vp.amount,
                VpConditionKind::Once | VpConditionKind::Per => {
                    tracing::debug!(card_id = %card.id, amount = vp.amount, "conditional victory points not awarded");
                }
                VpConditionKind::Unknown(kind) => {
                    tracing::warn!(card_id = %card.id, condition = %kind, "unknown victory point condition");
                }
            }
        }

        Ok(plan)
    }
}
