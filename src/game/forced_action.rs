//! Corporation forced first actions
//!
//! Some corporations must take a specific action before anything else
//! (draw cards, place a city). The action moves through
//! `Pending → Triggered → Completed` exactly once per player:
//!
//! - **Pending** is set when the corporation is selected.
//! - **Triggered** when the game enters the action phase on that player's
//!   turn: a pending card-draw or tile selection is created and stamped
//!   with the corporation id as its source.
//! - **Completed** when a card-draw confirmation or tile placement with
//!   the same source arrives.

use crate::core::{
    BehaviorShape, GameId, GamePhase, PendingCardDrawSelection, PendingTileSelection, PlayerId, ResourceKind,
};
use crate::core::ForcedActionState;
use crate::events::{DomainEvent, EventKind, SubscriptionId};
use crate::game::EngineContext;
use crate::{EngineError, Result};
use std::sync::{Arc, Mutex, Weak};

pub struct ForcedActionManager {
    ctx: EngineContext,
    game_id: GameId,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl ForcedActionManager {
    pub fn new(ctx: EngineContext, game_id: GameId) -> Arc<Self> {
        Arc::new(ForcedActionManager {
            ctx,
            game_id,
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Listen for phase changes and completion events
    pub fn register(self: &Arc<Self>) -> Result<()> {
        let mut ids = Vec::with_capacity(3);
        for kind in [
            EventKind::GamePhaseChanged,
            EventKind::CardDrawConfirmed,
            EventKind::TilePlaced,
        ] {
            let manager: Weak<Self> = Arc::downgrade(self);
            let id = self.ctx.bus.subscribe(kind, move |event| match manager.upgrade() {
                Some(manager) => manager.handle_event(event),
                None => Ok(()),
            })?;
            ids.push(id);
        }
        let mut subscriptions = self.subscriptions.lock().map_err(|_| EngineError::LockPoisoned)?;
        subscriptions.extend(ids);
        tracing::debug!(game_id = %self.game_id, "forced action manager registered");
        Ok(())
    }

    pub fn deregister(&self) -> Result<()> {
        let ids = {
            let mut subscriptions = self.subscriptions.lock().map_err(|_| EngineError::LockPoisoned)?;
            std::mem::take(&mut *subscriptions)
        };
        for id in ids {
            self.ctx.bus.unsubscribe(id)?;
        }
        Ok(())
    }

    fn handle_event(&self, event: &DomainEvent) -> Result<()> {
        if event.game_id() != &self.game_id {
            return Ok(());
        }
        match event {
            DomainEvent::GamePhaseChanged(e) if e.new_phase == GamePhase::Action => {
                let game = self.ctx.games.get_by_id(&self.game_id)?;
                match game.current_turn {
                    Some(player_id) => self.trigger(&player_id).map(|_| ()),
                    None => Ok(()),
                }
            }
            DomainEvent::CardDrawConfirmed(e) => self.complete_if_matching(&e.player_id, &e.source),
            DomainEvent::TilePlaced(e) => match &e.source {
                Some(source) => self.complete_if_matching(&e.player_id, source),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Trigger the player's forced action if it is still pending
    ///
    /// Returns whether a selection was created.
    pub fn trigger(&self, player_id: &PlayerId) -> Result<bool> {
        let game_id = &self.game_id;
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let Some(mut forced) = player.forced_first_action.clone() else {
            return Ok(false);
        };
        if !forced.is_pending() {
            return Ok(false);
        }

        let corporation = self.ctx.cards.get_card_by_id(&forced.corporation_id)?;
        let output = corporation
            .behaviors_with_shape(BehaviorShape::CorporationFirstAction)
            .find_map(|(_, b)| b.outputs.first())
            .ok_or_else(|| {
                EngineError::InvalidAction(format!(
                    "corporation {} has no forced first action",
                    corporation.id
                ))
            })?;
        let source = corporation.id.to_string();

        match &output.kind {
            ResourceKind::CardDraw => {
                let count = output.amount.max(0) as u32;
                let cards = self.ctx.deck.draw_project_cards(game_id, count)?;
                let selection = PendingCardDrawSelection {
                    available_cards: cards,
                    free_take_count: count,
                    max_buy_count: 0,
                    card_buy_cost: 0,
                    source: source.clone(),
                };
                self.ctx
                    .players
                    .update_pending_card_draw_selection(game_id, player_id, Some(selection))?;
            }
            ResourceKind::TilePlacement(tile) => {
                let game = self.ctx.games.get_by_id(game_id)?;
                let available_hexes = game.board.legal_hexes(*tile, player_id);
                if available_hexes.is_empty() {
                    return Err(EngineError::InvalidAction(format!(
                        "no legal hex for forced {tile} placement"
                    )));
                }
                let selection = PendingTileSelection {
                    tile: *tile,
                    available_hexes,
                    source: source.clone(),
                };
                self.ctx
                    .players
                    .update_pending_tile_selection(game_id, player_id, Some(selection))?;
            }
            other => {
                return Err(EngineError::Unsupported(format!("forced first action of kind {other}")));
            }
        }

        forced.state = ForcedActionState::Triggered;
        forced.source = Some(source);
        self.ctx
            .players
            .update_forced_first_action(game_id, player_id, Some(forced))?;
        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            corporation = %corporation.id,
            kind = %output.kind,
            "forced first action triggered"
        );
        Ok(true)
    }

    fn complete_if_matching(&self, player_id: &PlayerId, source: &str) -> Result<()> {
        let player = self.ctx.players.get_by_id(&self.game_id, player_id)?;
        let Some(mut forced) = player.forced_first_action else {
            return Ok(());
        };
        if !forced.matches_source(source) {
            return Ok(());
        }
        forced.state = ForcedActionState::Completed;
        self.ctx
            .players
            .update_forced_first_action(&self.game_id, player_id, Some(forced))?;
        tracing::info!(game_id = %self.game_id, player_id = %player_id, source, "forced first action completed");
        Ok(())
    }
}
