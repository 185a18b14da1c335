//! Resolving pending card-draw selections

use crate::core::{BaseResource, CardId, GameId, PlayerId};
use crate::events::{CardDrawConfirmed, DomainEvent};
use crate::game::EngineContext;
use crate::{EngineError, Result};

pub struct SelectionService {
    ctx: EngineContext,
}

impl SelectionService {
    pub fn new(ctx: EngineContext) -> Self {
        SelectionService { ctx }
    }

    /// Keep `selected` out of the pending draw
    ///
    /// The first `free_take_count` cards are free; each card beyond that
    /// costs `card_buy_cost` credits, up to `max_buy_count` bought cards.
    /// Cards not kept are discarded.
    pub fn confirm_card_draw(&self, game_id: &GameId, player_id: &PlayerId, selected: &[CardId]) -> Result<()> {
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let pending = player
            .pending_card_draw_selection
            .clone()
            .ok_or_else(|| EngineError::InvalidSelection("no card draw is pending".to_string()))?;

        for (i, card_id) in selected.iter().enumerate() {
            if !pending.available_cards.contains(card_id) {
                return Err(EngineError::InvalidSelection(format!("card {card_id} was not drawn")));
            }
            if selected[..i].contains(card_id) {
                return Err(EngineError::InvalidSelection(format!("card {card_id} selected twice")));
            }
        }

        let count = selected.len() as u32;
        let limit = pending.free_take_count + pending.max_buy_count;
        if count > limit {
            return Err(EngineError::InvalidSelection(format!(
                "selected {count} cards, at most {limit} allowed"
            )));
        }

        let bought = count.saturating_sub(pending.free_take_count) as i32;
        let cost = bought * pending.card_buy_cost;
        let mut resources = player.resources;
        if cost > 0 {
            let have = resources.get(BaseResource::Credits);
            if have < cost {
                return Err(EngineError::InsufficientResources(format!(
                    "buying {bought} cards costs {cost} credits, have {have}"
                )));
            }
            resources.add(BaseResource::Credits, -cost);
        }

        let mut hand = player.cards.clone();
        hand.extend(selected.iter().cloned());

        if cost > 0 {
            self.ctx.players.update_resources(game_id, player_id, resources)?;
        }
        self.ctx.players.update_hand(game_id, player_id, hand)?;
        self.ctx
            .players
            .update_pending_card_draw_selection(game_id, player_id, None)?;

        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            source = %pending.source,
            kept = count,
            bought,
            "card draw confirmed"
        );

        self.ctx.bus.publish(DomainEvent::CardDrawConfirmed(CardDrawConfirmed {
            game_id: game_id.clone(),
            player_id: player_id.clone(),
            source: pending.source,
            cards: selected.to_vec(),
        }))?;
        Ok(())
    }
}
