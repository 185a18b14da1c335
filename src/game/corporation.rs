//! Corporation selection

use crate::core::{BehaviorShape, CardId, ForcedFirstAction, GameId, PlayerId};
use crate::game::processor::CardProcessor;
use crate::game::EngineContext;
use crate::{EngineError, Result};
use std::sync::Arc;

pub struct CorporationService {
    ctx: EngineContext,
    processor: Arc<CardProcessor>,
}

impl CorporationService {
    pub fn new(ctx: EngineContext, processor: Arc<CardProcessor>) -> Self {
        CorporationService { ctx, processor }
    }

    /// Record the player's corporation and apply its starting behaviors
    ///
    /// A corporation with a first-action behavior leaves the player with a
    /// pending forced action, triggered once the action phase begins.
    pub fn select_corporation(&self, game_id: &GameId, player_id: &PlayerId, corporation_id: &CardId) -> Result<()> {
        let card = self.ctx.cards.get_card_by_id(corporation_id)?;
        if !card.is_corporation() {
            return Err(EngineError::InvalidAction(format!(
                "{} ({}) is not a corporation",
                card.name, card.id
            )));
        }

        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        if let Some(existing) = &player.corporation {
            return Err(EngineError::InvalidAction(format!(
                "player {player_id} already selected corporation {existing}"
            )));
        }

        self.ctx
            .players
            .update_corporation(game_id, player_id, Some(card.id.clone()))?;
        if let Err(err) = self.processor.apply_card_effects(game_id, player_id, &card, None, None) {
            // Effects were rewound; drop the corporation too
            self.ctx.players.update_corporation(game_id, player_id, None)?;
            return Err(err);
        }

        if let Some((_, behavior)) = card.behaviors_with_shape(BehaviorShape::CorporationFirstAction).next() {
            if let Some(output) = behavior.outputs.first() {
                let forced = ForcedFirstAction::new(
                    card.id.clone(),
                    output.kind.clone(),
                    format!("{}: {} {}", card.name, output.amount, output.kind),
                );
                self.ctx
                    .players
                    .update_forced_first_action(game_id, player_id, Some(forced))?;
                tracing::debug!(game_id = %game_id, player_id = %player_id, kind = %output.kind, "forced first action pending");
            }
        }

        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            corporation = %card.name,
            "corporation selected"
        );
        Ok(())
    }
}
