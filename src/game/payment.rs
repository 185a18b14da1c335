//! Card payment resolution
//!
//! A card's price is described by a [`PaymentEnvelope`]: the credit cost
//! after discounts, and which alternate currencies the card accepts. Steel
//! is accepted by building cards, titanium by space cards, and payment
//! substitutes (e.g. heat as credits) come from the player's static effects.
//!
//! A proposed [`CardPayment`] is first validated against the envelope and
//! the player's holdings, then applied to a copy of the resource pool so a
//! failed apply never leaves a partial debit behind.

use crate::config::RulesConfig;
use crate::core::{
    BaseResource, BehaviorShape, Card, PaymentSubstitute, Player, ResourceKind, ResourceSet, Tag,
};
use crate::game::requirements::charges_other_player;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a player offers to pay for a card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPayment {
    pub credits: i32,
    pub steel: i32,
    pub titanium: i32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub substitutes: BTreeMap<ResourceKind, i32>,
}

impl CardPayment {
    pub fn credits(credits: i32) -> Self {
        CardPayment {
            credits,
            ..Default::default()
        }
    }

    pub fn with_steel(mut self, steel: i32) -> Self {
        self.steel = steel;
        self
    }

    pub fn with_titanium(mut self, titanium: i32) -> Self {
        self.titanium = titanium;
        self
    }

    pub fn with_substitute(mut self, kind: impl Into<ResourceKind>, amount: i32) -> Self {
        self.substitutes.insert(kind.into(), amount);
        self
    }

    fn has_negative(&self) -> bool {
        self.credits < 0 || self.steel < 0 || self.titanium < 0 || self.substitutes.values().any(|v| *v < 0)
    }
}

/// Price of a card for one particular player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEnvelope {
    pub base_cost: i32,
    pub can_use_steel: bool,
    pub can_use_titanium: bool,
    pub substitutes: Vec<PaymentSubstitute>,
}

impl PaymentEnvelope {
    fn substitute_rate(&self, resource: BaseResource) -> Option<i32> {
        self.substitutes
            .iter()
            .find(|s| s.resource == resource)
            .map(|s| s.conversion_rate)
    }
}

pub struct PaymentResolver {
    rules: Arc<RulesConfig>,
}

impl PaymentResolver {
    pub fn new(rules: Arc<RulesConfig>) -> Self {
        PaymentResolver { rules }
    }

    /// Cost envelope of `card` for `player`, after the player's discounts
    pub fn envelope(&self, card: &Card, player: &Player) -> PaymentEnvelope {
        let discount: i32 = player
            .effects
            .iter()
            .flat_map(|e| e.behavior.static_modifiers())
            .filter(|o| o.kind == ResourceKind::Discount)
            .filter(|o| o.affected_tags.is_empty() || o.affected_tags.iter().any(|t| card.has_tag(t)))
            .map(|o| o.amount)
            .sum();

        PaymentEnvelope {
            base_cost: (card.cost - discount).max(0),
            can_use_steel: card.has_tag(&Tag::Building),
            can_use_titanium: card.has_tag(&Tag::Space),
            substitutes: player.payment_substitutes(),
        }
    }

    /// Check a proposed payment against the envelope and holdings
    pub fn validate(&self, payment: &CardPayment, envelope: &PaymentEnvelope, resources: &ResourceSet) -> Result<()> {
        if payment.has_negative() {
            return Err(EngineError::InvalidPayment("payment amounts cannot be negative".to_string()));
        }
        if payment.steel > 0 && !envelope.can_use_steel {
            return Err(EngineError::InvalidPayment("card does not accept steel".to_string()));
        }
        if payment.titanium > 0 && !envelope.can_use_titanium {
            return Err(EngineError::InvalidPayment("card does not accept titanium".to_string()));
        }

        let debit = self.debit(payment)?;
        for (resource, amount) in debit.iter() {
            let have = resources.get(resource);
            if amount > have {
                return Err(EngineError::InsufficientResources(format!(
                    "insufficient {resource}: have {have}, need {amount}"
                )));
            }
        }

        let mut value = payment
            .steel
            .checked_mul(self.rules.steel_value)
            .zip(payment.titanium.checked_mul(self.rules.titanium_value))
            .and_then(|(steel, titanium)| payment.credits.checked_add(steel)?.checked_add(titanium))
            .ok_or_else(value_out_of_range)?;
        for (kind, amount) in &payment.substitutes {
            let resource = substitute_resource(kind)?;
            let rate = envelope.substitute_rate(resource).ok_or_else(|| {
                EngineError::InvalidPayment(format!("{resource} is not accepted as payment"))
            })?;
            value = amount
                .checked_mul(rate)
                .and_then(|worth| value.checked_add(worth))
                .ok_or_else(value_out_of_range)?;
        }

        if value < envelope.base_cost {
            return Err(EngineError::InvalidPayment(format!(
                "payment worth {value} does not cover cost {}",
                envelope.base_cost
            )));
        }

        let credits_needed = (envelope.base_cost - (value - payment.credits)).max(0);
        if payment.credits > credits_needed {
            return Err(EngineError::InvalidPayment(format!(
                "overpaying with credits: offered {}, at most {credits_needed} needed",
                payment.credits
            )));
        }

        Ok(())
    }

    /// Debit the payment from a copy of `resources`
    pub fn apply(&self, payment: &CardPayment, resources: &ResourceSet) -> Result<ResourceSet> {
        let delta = negate(&self.debit(payment)?);
        if let Some((resource, have, need)) = resources.first_shortfall(&delta) {
            return Err(EngineError::InsufficientResources(format!(
                "insufficient {resource}: have {have}, need {need}"
            )));
        }
        let mut remaining = *resources;
        remaining.apply_delta(&delta);
        Ok(remaining)
    }

    /// Per-resource amounts the payment takes from the pool
    fn debit(&self, payment: &CardPayment) -> Result<ResourceSet> {
        let mut debit = ResourceSet::new()
            .with(BaseResource::Credits, payment.credits)
            .with(BaseResource::Steel, payment.steel)
            .with(BaseResource::Titanium, payment.titanium);
        for (kind, amount) in &payment.substitutes {
            let total = debit.get_mut(substitute_resource(kind)?);
            *total = total.checked_add(*amount).ok_or_else(value_out_of_range)?;
        }
        Ok(debit)
    }
}

fn value_out_of_range() -> EngineError {
    EngineError::InvalidPayment("payment value out of range".to_string())
}

fn substitute_resource(kind: &ResourceKind) -> Result<BaseResource> {
    match kind {
        ResourceKind::Resource(resource) => Ok(*resource),
        other => Err(EngineError::UnknownSubstitute(other.as_string())),
    }
}

pub(crate) fn negate(set: &ResourceSet) -> ResourceSet {
    let mut negated = ResourceSet::new();
    for (resource, amount) in set.iter() {
        negated.add(resource, -amount);
    }
    negated
}

/// Base resources consumed by a card's immediate behaviors
///
/// Covers behavior inputs and negative resource outputs; outputs aimed at
/// other players are not charged to the acting player. Returned as a
/// negative delta ready for [`ResourceSet::first_shortfall`].
pub fn immediate_costs(card: &Card, choice: Option<usize>) -> ResourceSet {
    let mut delta = ResourceSet::new();
    for (_, behavior) in card.behaviors_with_shape(BehaviorShape::Immediate) {
        for input in behavior.inputs_with_choice(choice) {
            if let ResourceKind::Resource(resource) = input.kind {
                delta.add(resource, -input.amount);
            }
        }
        for output in behavior.outputs_with_choice(choice) {
            if let ResourceKind::Resource(resource) = output.kind {
                if output.amount < 0 && !charges_other_player(output) {
                    delta.add(resource, output.amount);
                }
            }
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Behavior, CardId, CardType, PlayerEffect, ResourceCondition, Target};

    fn resolver() -> PaymentResolver {
        PaymentResolver::new(Arc::new(RulesConfig::default()))
    }

    fn building_card(cost: i32) -> Card {
        Card::new("B1", "Factory", CardType::Automated, cost).with_tags([Tag::Building])
    }

    fn helion() -> Player {
        let mut output = ResourceCondition::new("payment-substitute", 1);
        output.affected_resources = vec![ResourceKind::Resource(BaseResource::Heat)];
        let mut player = Player::new("p1", "Alice");
        player.effects.push(PlayerEffect::new(
            CardId::new("HELION"),
            "Helion",
            0,
            Behavior::immediate(vec![output]),
        ));
        player
    }

    #[test]
    fn test_steel_payment_for_building_card() {
        let r = resolver();
        let player = Player::new("p1", "Alice");
        let envelope = r.envelope(&building_card(18), &player);
        assert!(envelope.can_use_steel);
        assert!(!envelope.can_use_titanium);

        let resources = ResourceSet::new()
            .with(BaseResource::Credits, 20)
            .with(BaseResource::Steel, 5);
        let payment = CardPayment::credits(12).with_steel(3);
        r.validate(&payment, &envelope, &resources).unwrap();

        let after = r.apply(&payment, &resources).unwrap();
        assert_eq!(after.credits, 8);
        assert_eq!(after.steel, 2);
    }

    #[test]
    fn test_titanium_rejected_without_space_tag() {
        let r = resolver();
        let envelope = r.envelope(&building_card(10), &Player::new("p1", "Alice"));
        let resources = ResourceSet::new().with(BaseResource::Titanium, 4);
        let err = r
            .validate(&CardPayment::default().with_titanium(4), &envelope, &resources)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayment(_)));
    }

    #[test]
    fn test_overpaying_with_credits_is_rejected() {
        let r = resolver();
        let envelope = r.envelope(&building_card(10), &Player::new("p1", "Alice"));
        let resources = ResourceSet::new()
            .with(BaseResource::Credits, 30)
            .with(BaseResource::Steel, 5);

        let err = r
            .validate(&CardPayment::credits(8).with_steel(2), &envelope, &resources)
            .unwrap_err();
        assert!(err.to_string().contains("overpaying"));

        // Excess steel value is simply lost
        assert!(r
            .validate(&CardPayment::default().with_steel(5), &envelope, &resources)
            .is_ok());
    }

    #[test]
    fn test_underpayment_and_missing_holdings() {
        let r = resolver();
        let envelope = r.envelope(&building_card(10), &Player::new("p1", "Alice"));
        let resources = ResourceSet::new().with(BaseResource::Credits, 6);

        let short = r.validate(&CardPayment::credits(6), &envelope, &resources).unwrap_err();
        assert!(matches!(short, EngineError::InvalidPayment(_)));

        let broke = r.validate(&CardPayment::credits(10), &envelope, &resources).unwrap_err();
        assert!(matches!(broke, EngineError::InsufficientResources(_)));
    }

    #[test]
    fn test_oversized_payment_is_rejected() {
        let r = resolver();
        let envelope = r.envelope(&building_card(10), &Player::new("p1", "Alice"));
        let payment = CardPayment::default().with_steel(i32::MAX);

        let err = r.validate(&payment, &envelope, &ResourceSet::new()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientResources(_)));

        // Holding that much steel still cannot be valued
        let hoard = ResourceSet::new().with(BaseResource::Steel, i32::MAX);
        let err = r.validate(&payment, &envelope, &hoard).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayment(_)));

        let player = helion();
        let card = Card::new("P1", "Project", CardType::Automated, 7);
        let heat = ResourceSet::new()
            .with(BaseResource::Credits, i32::MAX)
            .with(BaseResource::Heat, i32::MAX);
        let payment = CardPayment::credits(i32::MAX).with_substitute("heat", i32::MAX);
        let err = r.validate(&payment, &r.envelope(&card, &player), &heat).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayment(_)));
    }

    #[test]
    fn test_heat_substitute() {
        let r = resolver();
        let player = helion();
        let card = Card::new("P1", "Project", CardType::Automated, 7);
        let envelope = r.envelope(&card, &player);
        let resources = ResourceSet::new()
            .with(BaseResource::Credits, 5)
            .with(BaseResource::Heat, 4);

        let payment = CardPayment::credits(3).with_substitute("heat", 4);
        r.validate(&payment, &envelope, &resources).unwrap();
        let after = r.apply(&payment, &resources).unwrap();
        assert_eq!(after.credits, 2);
        assert_eq!(after.heat, 0);

        // Not granted to a player without the effect
        let plain = r.envelope(&card, &Player::new("p2", "Bob"));
        assert!(r.validate(&payment, &plain, &resources).is_err());
    }

    #[test]
    fn test_unknown_substitute_kind() {
        let r = resolver();
        let payment = CardPayment::default().with_substitute("microbes", 2);
        let err = r.apply(&payment, &ResourceSet::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSubstitute(_)));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let r = resolver();
        let resources = ResourceSet::new().with(BaseResource::Credits, 10);
        let err = r
            .apply(&CardPayment::credits(5).with_steel(1), &resources)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientResources(_)));
        assert_eq!(resources.credits, 10);
    }

    #[test]
    fn test_discount_matches_tags_and_floors_at_zero() {
        let r = resolver();
        let mut discount = ResourceCondition::new("discount", 3);
        discount.affected_tags = vec![Tag::Space];
        let mut player = Player::new("p1", "Alice");
        player.effects.push(PlayerEffect::new(
            CardId::new("SPACE"),
            "Space Station",
            0,
            Behavior::immediate(vec![discount]),
        ));

        let space = Card::new("S1", "Satellite", CardType::Automated, 2).with_tags([Tag::Space]);
        assert_eq!(r.envelope(&space, &player).base_cost, 0);
        assert_eq!(r.envelope(&building_card(10), &player).base_cost, 10);
    }

    #[test]
    fn test_immediate_costs() {
        let card = Card::new("E1", "Big Asteroid", CardType::Event, 27)
            .with_behavior(Behavior::immediate(vec![
                ResourceCondition::new("credits", -4),
                ResourceCondition::new("plants", -4).with_target(Target::AnyPlayer),
                ResourceCondition::new("temperature", 2),
            ]))
            .with_behavior(Behavior::manual(
                vec![ResourceCondition::new("energy", 1)],
                vec![],
            ));

        let costs = immediate_costs(&card, None);
        assert_eq!(costs.credits, -4);
        assert_eq!(costs.plants, 0);
        assert_eq!(costs.energy, 0);
    }
}
