//! Manual card actions
//!
//! Cards with a manual trigger register a [`PlayerAction`](crate::core::PlayerAction)
//! when played. Each action can be used once per generation: its inputs are
//! paid, its outputs applied through the same staged plan as card effects,
//! and its play count bumped in the same commit.

use crate::core::{CardId, GameId, PlayerId};
use crate::game::card_manager::validate_choice;
use crate::game::plan::{EffectPlan, OutputScope};
use crate::game::requirements::check_production_floors;
use crate::game::subscriber::EffectSubscriber;
use crate::game::EngineContext;
use crate::{EngineError, Result};
use std::sync::Arc;

pub struct CardActionService {
    ctx: EngineContext,
    subscriber: Arc<EffectSubscriber>,
}

impl CardActionService {
    pub fn new(ctx: EngineContext, subscriber: Arc<EffectSubscriber>) -> Self {
        CardActionService { ctx, subscriber }
    }

    /// Use the action registered for `card_id` at `behavior_index`
    pub fn play_card_action(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        card_id: &CardId,
        behavior_index: usize,
        choice: Option<usize>,
        storage_target: Option<&CardId>,
    ) -> Result<()> {
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let action = player.find_action(card_id, behavior_index).ok_or_else(|| {
            EngineError::InvalidAction(format!("card {card_id} has no action at index {behavior_index}"))
        })?;
        if !action.is_available() {
            return Err(EngineError::InvalidAction(format!(
                "action on {} already played this generation",
                action.card_name
            )));
        }
        let behavior = &action.behavior;
        validate_choice(behavior.choices.len(), choice)?;

        let mut plan = EffectPlan::new(game_id.clone(), player_id.clone(), card_id.clone());
        let scope = OutputScope {
            self_card: card_id,
            played_cards: &player.played_cards,
            storage_target,
        };

        for input in behavior.inputs_with_choice(choice) {
            plan.add_input(input, &scope)?;
        }
        if let Some((resource, have, need)) = player.resources.first_shortfall(&plan.resources) {
            return Err(EngineError::InsufficientResources(format!(
                "insufficient {resource}: have {have}, need {need}"
            )));
        }
        for (target, amount) in &plan.storage {
            let have = player.storage(target);
            if have + amount < 0 {
                return Err(EngineError::InsufficientResources(format!(
                    "insufficient resources on {target}: have {have}, need {}",
                    -amount
                )));
            }
        }
        let mut production = player.production;
        production.apply_delta(&plan.production);
        for (resource, amount) in plan.production.iter() {
            let floor = self.ctx.rules.production_floor(resource);
            if amount < 0 && production.get(resource) < floor {
                return Err(EngineError::InsufficientResources(format!(
                    "insufficient {resource} production: would drop to {} (minimum {floor})",
                    production.get(resource)
                )));
            }
        }

        let outputs = behavior.outputs_with_choice(choice);
        check_production_floors(&self.ctx.rules, &production, outputs.iter().copied())?;
        for output in outputs {
            plan.add_output(output, &scope)?;
        }
        if let Some((resource, have, need)) = player.resources.first_shortfall(&plan.resources) {
            return Err(EngineError::InsufficientResources(format!(
                "insufficient {resource}: have {have}, need {need}"
            )));
        }

        plan.played_action = Some((card_id.clone(), behavior_index));
        plan.commit(&self.ctx, Some(&self.subscriber))?;

        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            card_id = %card_id,
            behavior_index,
            "card action played"
        );
        Ok(())
    }

    /// Make every action usable again at the start of a generation
    ///
    /// Returns how many actions were reset.
    pub fn reset_action_play_counts(&self, game_id: &GameId) -> Result<usize> {
        let mut reset = 0;
        for player in self.ctx.players.list_players(game_id)? {
            if player.actions.iter().all(|a| a.play_count == 0) {
                continue;
            }
            let mut actions = player.actions;
            for action in actions.iter_mut().filter(|a| a.play_count > 0) {
                action.play_count = 0;
                reset += 1;
            }
            self.ctx.players.update_player_actions(game_id, &player.id, actions)?;
        }
        tracing::debug!(game_id = %game_id, reset, "action play counts reset");
        Ok(reset)
    }
}
