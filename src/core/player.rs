//! Player representation

use crate::board::HexCoord;
use crate::core::{BaseResource, Behavior, BehaviorShape, CardId, PlayerId, ResourceKind, ResourceSet, TileKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A repeatable, player-invoked capability registered from a manual behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub card_id: CardId,
    pub card_name: String,
    pub behavior_index: usize,
    pub behavior: Behavior,
    /// Times played this generation
    pub play_count: u32,
}

impl PlayerAction {
    pub fn new(card_id: CardId, card_name: impl Into<String>, behavior_index: usize, behavior: Behavior) -> Self {
        PlayerAction {
            card_id,
            card_name: card_name.into(),
            behavior_index,
            behavior,
            play_count: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.play_count == 0
    }
}

/// A standing ability registered from an auto behavior
///
/// Either event-driven (the behavior has a trigger condition and is wired to
/// the event bus) or static (a discount or lenience modifier that is read by
/// the validators and never fires).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEffect {
    pub card_id: CardId,
    pub card_name: String,
    pub behavior_index: usize,
    pub behavior: Behavior,
}

impl PlayerEffect {
    pub fn new(card_id: CardId, card_name: impl Into<String>, behavior_index: usize, behavior: Behavior) -> Self {
        PlayerEffect {
            card_id,
            card_name: card_name.into(),
            behavior_index,
            behavior,
        }
    }

    pub fn is_passive(&self) -> bool {
        self.behavior.shape() == BehaviorShape::Passive
    }
}

/// Alternate currency usable in card payments (e.g. heat as credits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubstitute {
    pub resource: BaseResource,
    pub conversion_rate: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForcedActionState {
    Pending,
    Triggered,
    Completed,
}

/// Corporation-specific action the player must take first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedFirstAction {
    pub corporation_id: CardId,
    pub action_kind: ResourceKind,
    pub description: String,
    pub state: ForcedActionState,
    /// Stamped when triggered, matched on completion
    pub source: Option<String>,
}

impl ForcedFirstAction {
    pub fn new(corporation_id: CardId, action_kind: ResourceKind, description: impl Into<String>) -> Self {
        ForcedFirstAction {
            corporation_id,
            action_kind,
            description: description.into(),
            state: ForcedActionState::Pending,
            source: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == ForcedActionState::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.state == ForcedActionState::Completed
    }

    pub fn matches_source(&self, source: &str) -> bool {
        self.state == ForcedActionState::Triggered && self.source.as_deref() == Some(source)
    }
}

/// A deferred "place this tile" request waiting for the player's pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTileSelection {
    pub tile: TileKind,
    pub available_hexes: Vec<HexCoord>,
    pub source: String,
}

/// A deferred card draw waiting for the player to pick cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCardDrawSelection {
    pub available_cards: Vec<CardId>,
    pub free_take_count: u32,
    pub max_buy_count: u32,
    pub card_buy_cost: i32,
    pub source: String,
}

/// Tiles still to be placed for a single source, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileQueue {
    pub source: String,
    pub items: VecDeque<TileKind>,
}

/// Represents a player in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,

    pub name: String,

    /// Selected corporation card
    pub corporation: Option<CardId>,

    /// Hand
    pub cards: Vec<CardId>,

    /// Played cards, append-only
    pub played_cards: Vec<CardId>,

    pub resources: ResourceSet,

    pub production: ResourceSet,

    pub terraform_rating: i32,

    pub victory_points: i32,

    pub actions: Vec<PlayerAction>,

    pub effects: Vec<PlayerEffect>,

    /// Tokens held on played cards, lazily initialized
    pub resource_storage: FxHashMap<CardId, i32>,

    pub forced_first_action: Option<ForcedFirstAction>,

    pub pending_tile_selection: Option<PendingTileSelection>,

    pub pending_card_draw_selection: Option<PendingCardDrawSelection>,

    pub tile_queue: Option<TileQueue>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            corporation: None,
            cards: Vec::new(),
            played_cards: Vec::new(),
            resources: ResourceSet::default(),
            production: ResourceSet::default(),
            terraform_rating: 20,
            victory_points: 0,
            actions: Vec::new(),
            effects: Vec::new(),
            resource_storage: FxHashMap::default(),
            forced_first_action: None,
            pending_tile_selection: None,
            pending_card_draw_selection: None,
            tile_queue: None,
        }
    }

    pub fn with_resources(mut self, resources: ResourceSet) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_production(mut self, production: ResourceSet) -> Self {
        self.production = production;
        self
    }

    pub fn with_hand(mut self, cards: impl IntoIterator<Item = CardId>) -> Self {
        self.cards = cards.into_iter().collect();
        self
    }

    pub fn has_in_hand(&self, card_id: &CardId) -> bool {
        self.cards.contains(card_id)
    }

    pub fn has_played(&self, card_id: &CardId) -> bool {
        self.played_cards.contains(card_id)
    }

    /// Tokens on a card (0 if never initialized)
    pub fn storage(&self, card_id: &CardId) -> i32 {
        self.resource_storage.get(card_id).copied().unwrap_or(0)
    }

    pub fn find_action(&self, card_id: &CardId, behavior_index: usize) -> Option<&PlayerAction> {
        self.actions
            .iter()
            .find(|a| &a.card_id == card_id && a.behavior_index == behavior_index)
    }

    /// Payment substitutes granted by the player's static effects
    pub fn payment_substitutes(&self) -> Vec<PaymentSubstitute> {
        let mut substitutes = Vec::new();
        for effect in &self.effects {
            for output in effect.behavior.static_modifiers() {
                if output.kind != ResourceKind::PaymentSubstitute {
                    continue;
                }
                for affected in &output.affected_resources {
                    if let ResourceKind::Resource(resource) = affected {
                        substitutes.push(PaymentSubstitute {
                            resource: *resource,
                            conversion_rate: output.amount,
                        });
                    }
                }
            }
        }
        substitutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceCondition;

    #[test]
    fn test_player_creation() {
        let player = Player::new("p1", "Alice");
        assert_eq!(player.id.as_str(), "p1");
        assert_eq!(player.terraform_rating, 20);
        assert!(player.resources.is_zero());
        assert_eq!(player.storage(&CardId::new("any")), 0);
    }

    #[test]
    fn test_find_action_by_card_and_index() {
        let mut player = Player::new("p1", "Alice");
        player.actions.push(PlayerAction::new(CardId::new("A"), "A", 1, Behavior::manual(vec![], vec![])));

        assert!(player.find_action(&CardId::new("A"), 1).is_some());
        assert!(player.find_action(&CardId::new("A"), 0).is_none());
        assert!(player.find_action(&CardId::new("A"), 1).map(|a| a.is_available()).unwrap_or(false));
    }

    #[test]
    fn test_payment_substitutes_from_effects() {
        let mut player = Player::new("p1", "Alice");
        let mut output = ResourceCondition::new("payment-substitute", 1);
        output.affected_resources = vec![ResourceKind::Resource(BaseResource::Heat)];
        player.effects.push(PlayerEffect::new(
            CardId::new("HELION"),
            "Helion",
            0,
            Behavior::immediate(vec![output]),
        ));

        let subs = player.payment_substitutes();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].resource, BaseResource::Heat);
        assert_eq!(subs[0].conversion_rate, 1);
    }

    #[test]
    fn test_forced_action_source_matching() {
        let mut forced = ForcedFirstAction::new(
            CardId::new("CORP"),
            ResourceKind::CardDraw,
            "Draw 3 cards",
        );
        assert!(forced.is_pending());
        assert!(!forced.matches_source("CORP"));

        forced.state = ForcedActionState::Triggered;
        forced.source = Some("CORP".to_string());
        assert!(forced.matches_source("CORP"));
        assert!(!forced.matches_source("OTHER"));
    }
}
