//! Playing project cards from hand
//!
//! [`CardManager::play_card`] runs the full play flow: hand check,
//! requirements, choice, payment, affordability of immediate costs, then the
//! writes (payment and inputs, hand to played, storage initialization),
//! effect application and finally the `CardPlayed` event. The writes made
//! here share an undo log so a failure while applying effects leaves the
//! player exactly as before.

use crate::core::{BehaviorShape, Card, CardId, Game, GameId, Player, PlayerId, ResourceKind, ResourceSet};
use crate::events::{CardPlayed, DomainEvent};
use crate::game::payment::{immediate_costs, CardPayment, PaymentResolver};
use crate::game::processor::CardProcessor;
use crate::game::requirements::{check_production_floors, RequirementsValidator};
use crate::game::EngineContext;
use crate::undo::{StateChange, UndoLog};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a player submits to play one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardRequest {
    pub card_id: CardId,
    #[serde(default)]
    pub payment: CardPayment,
    #[serde(default)]
    pub choice_index: Option<usize>,
    /// Card receiving any-card storage outputs
    #[serde(default)]
    pub storage_target: Option<CardId>,
}

impl PlayCardRequest {
    pub fn new(card_id: impl Into<CardId>, payment: CardPayment) -> Self {
        PlayCardRequest {
            card_id: card_id.into(),
            payment,
            choice_index: None,
            storage_target: None,
        }
    }

    pub fn with_choice(mut self, index: usize) -> Self {
        self.choice_index = Some(index);
        self
    }

    pub fn with_storage_target(mut self, card_id: impl Into<CardId>) -> Self {
        self.storage_target = Some(card_id.into());
        self
    }
}

/// Check a choice index against the number of choices a behavior offers
pub(crate) fn validate_choice(available: usize, choice: Option<usize>) -> Result<()> {
    match (available, choice) {
        (0, _) => Ok(()),
        (_, None) => Err(EngineError::InvalidAction(format!(
            "a choice is required (0..{available})"
        ))),
        (n, Some(index)) if index >= n => Err(EngineError::InvalidAction(format!(
            "choice index {index} out of range, {n} choices available"
        ))),
        _ => Ok(()),
    }
}

pub struct CardManager {
    ctx: EngineContext,
    validator: RequirementsValidator,
    payments: PaymentResolver,
    processor: Arc<CardProcessor>,
}

impl CardManager {
    pub fn new(ctx: EngineContext, processor: Arc<CardProcessor>) -> Self {
        CardManager {
            validator: RequirementsValidator::new(ctx.cards.clone(), ctx.rules.clone()),
            payments: PaymentResolver::new(ctx.rules.clone()),
            ctx,
            processor,
        }
    }

    pub fn payments(&self) -> &PaymentResolver {
        &self.payments
    }

    /// Run every check of the play flow without writing anything
    pub fn can_play(&self, game_id: &GameId, player_id: &PlayerId, request: &PlayCardRequest) -> Result<()> {
        let game = self.ctx.games.get_by_id(game_id)?;
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let card = self.ctx.cards.get_card_by_id(&request.card_id)?;
        self.check(&game, &player, &card, request).map(|_| ())
    }

    /// Play a card from hand
    pub fn play_card(&self, game_id: &GameId, player_id: &PlayerId, request: &PlayCardRequest) -> Result<()> {
        let game = self.ctx.games.get_by_id(game_id)?;
        let player = self.ctx.players.get_by_id(game_id, player_id)?;
        let card = self.ctx.cards.get_card_by_id(&request.card_id)?;
        let after_payment = self.check(&game, &player, &card, request)?;

        let mut log = UndoLog::new(game_id.clone());
        if let Err(err) = self.write_play(game_id, &player, &card, request, after_payment, &mut log) {
            self.rewind(game_id, &mut log);
            return Err(err);
        }

        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            card_id = %card.id,
            card = %card.name,
            credits = request.payment.credits,
            steel = request.payment.steel,
            titanium = request.payment.titanium,
            "card played"
        );

        self.ctx.bus.publish(DomainEvent::CardPlayed(CardPlayed {
            game_id: game_id.clone(),
            player_id: player_id.clone(),
            card_id: card.id.clone(),
            card_name: card.name.clone(),
            card_type: card.card_type,
            tags: card.tags.to_vec(),
        }))?;
        Ok(())
    }

    /// Steps 1-5 of the play flow; returns the resources left after payment
    fn check(&self, game: &Game, player: &Player, card: &Card, request: &PlayCardRequest) -> Result<ResourceSet> {
        if !player.has_in_hand(&card.id) {
            return Err(EngineError::InvalidAction(format!("card {} is not in hand", card.id)));
        }

        self.validator.validate(game, player, card)?;

        // Manual actions resolve their own choices when activated
        let choices = card
            .behaviors_with_shape(BehaviorShape::Immediate)
            .map(|(_, b)| b.choices.len())
            .max()
            .unwrap_or(0);
        validate_choice(choices, request.choice_index)?;

        let envelope = self.payments.envelope(card, player);
        self.payments.validate(&request.payment, &envelope, &player.resources)?;
        let after_payment = self.payments.apply(&request.payment, &player.resources)?;

        let costs = immediate_costs(card, request.choice_index);
        if let Some((resource, have, need)) = after_payment.first_shortfall(&costs) {
            return Err(EngineError::InsufficientResources(format!(
                "insufficient {resource} after payment: have {have}, need {need}"
            )));
        }

        let outputs = card
            .behaviors_with_shape(BehaviorShape::Immediate)
            .flat_map(|(_, b)| b.outputs_with_choice(request.choice_index));
        check_production_floors(&self.ctx.rules, &player.production, outputs)?;

        // Surfaces storage-target problems before anything is written. Effects
        // apply after the card is played, so it may name itself as the target.
        let mut played = player.clone();
        played.played_cards.push(card.id.clone());
        self.processor.plan_card_effects(
            &game.id,
            &played,
            card,
            request.choice_index,
            request.storage_target.as_ref(),
        )?;

        Ok(after_payment)
    }

    fn write_play(
        &self,
        game_id: &GameId,
        player: &Player,
        card: &Card,
        request: &PlayCardRequest,
        after_payment: ResourceSet,
        log: &mut UndoLog,
    ) -> Result<()> {
        let players = &self.ctx.players;
        let player_id = &player.id;

        let mut resources = after_payment;
        resources.apply_delta(&immediate_inputs(card, request.choice_index));
        if resources != player.resources {
            log.log(StateChange::Resources {
                player_id: player_id.clone(),
                previous: player.resources,
            });
            players.update_resources(game_id, player_id, resources)?;
        }

        let hand: Vec<CardId> = player.cards.iter().filter(|c| **c != card.id).cloned().collect();
        log.log(StateChange::Hand {
            player_id: player_id.clone(),
            previous: player.cards.clone(),
        });
        players.update_hand(game_id, player_id, hand)?;

        let mut played = player.played_cards.clone();
        played.push(card.id.clone());
        log.log(StateChange::PlayedCards {
            player_id: player_id.clone(),
            previous: player.played_cards.clone(),
        });
        players.update_played_cards(game_id, player_id, played)?;

        if let Some(storage) = &card.resource_storage {
            let mut pools = player.resource_storage.clone();
            pools.insert(card.id.clone(), storage.starting);
            log.log(StateChange::ResourceStorage {
                player_id: player_id.clone(),
                previous: player.resource_storage.clone(),
            });
            players.update_resource_storage(game_id, player_id, pools)?;
        }

        self.processor.apply_card_effects(
            game_id,
            player_id,
            card,
            request.choice_index,
            request.storage_target.as_ref(),
        )
    }

    fn rewind(&self, game_id: &GameId, log: &mut UndoLog) {
        let mut no_subscriptions = |_: &CardId| Ok(());
        if let Err(err) = log.rewind(self.ctx.games.as_ref(), self.ctx.players.as_ref(), &mut no_subscriptions) {
            tracing::error!(game_id = %game_id, error = %err, "rewind incomplete");
        }
    }
}

/// Base resource inputs of the card's immediate behaviors, as a negative delta
fn immediate_inputs(card: &Card, choice: Option<usize>) -> ResourceSet {
    let mut delta = ResourceSet::new();
    for (_, behavior) in card.behaviors_with_shape(BehaviorShape::Immediate) {
        for input in behavior.inputs_with_choice(choice) {
            if let ResourceKind::Resource(resource) = input.kind {
                delta.add(resource, -input.amount);
            }
        }
    }
    delta
}
