//! Card requirement validation
//!
//! Every requirement on a card must hold before the card may be played.
//! Bounds are inclusive and a missing bound leaves that side open.
//! Requirement kinds the engine does not model pass, so that catalog data
//! can run ahead of the engine.

use crate::config::RulesConfig;
use crate::core::{
    BaseResource, Card, Game, GlobalParameter, Player, Requirement, RequirementKind, ResourceCondition,
    ResourceKind, ResourceSet, Tag, Target, TileKind,
};
use crate::repository::CardRepository;
use crate::{EngineError, Result};
use std::sync::Arc;

pub struct RequirementsValidator {
    cards: Arc<dyn CardRepository>,
    rules: Arc<RulesConfig>,
}

impl RequirementsValidator {
    pub fn new(cards: Arc<dyn CardRepository>, rules: Arc<RulesConfig>) -> Self {
        RequirementsValidator { cards, rules }
    }

    /// Check every requirement of `card`, stopping at the first failure
    pub fn validate(&self, game: &Game, player: &Player, card: &Card) -> Result<()> {
        for requirement in &card.requirements {
            self.validate_single(requirement, game, player)?;
        }
        tracing::trace!(
            game_id = %game.id,
            player_id = %player.id,
            card_id = %card.id,
            requirements = card.requirements.len(),
            "requirements satisfied"
        );
        Ok(())
    }

    fn validate_single(&self, requirement: &Requirement, game: &Game, player: &Player) -> Result<()> {
        match &requirement.kind {
            RequirementKind::Temperature => {
                self.check_parameter(requirement, GlobalParameter::Temperature, game, player)
            }
            RequirementKind::Oxygen => self.check_parameter(requirement, GlobalParameter::Oxygen, game, player),
            RequirementKind::Oceans => self.check_parameter(requirement, GlobalParameter::Oceans, game, player),
            RequirementKind::TerraformRating => check_bounds(
                "terraform rating",
                requirement.min,
                requirement.max,
                player.terraform_rating,
            ),
            RequirementKind::Tags => match &requirement.tag {
                Some(tag) => check_tag_bounds(tag, requirement, self.count_tags(player, tag)),
                None => {
                    tracing::debug!("tag requirement names no tag, passing");
                    Ok(())
                }
            },
            RequirementKind::Production => check_production(requirement, &player.production),
            RequirementKind::Resource => match &requirement.resource {
                Some(ResourceKind::Resource(resource)) => check_bounds(
                    resource.as_str(),
                    requirement.min,
                    requirement.max,
                    player.resources.get(*resource),
                ),
                // Card storage and other non-pool kinds are not tracked here
                other => {
                    tracing::debug!(resource = ?other, "resource requirement not modeled, passing");
                    Ok(())
                }
            },
            RequirementKind::Cities => check_bounds(
                "cities",
                requirement.min,
                requirement.max,
                game.board.count_tiles(TileKind::City, Some(&player.id)),
            ),
            RequirementKind::Greeneries => check_bounds(
                "greeneries",
                requirement.min,
                requirement.max,
                game.board.count_tiles(TileKind::Greenery, Some(&player.id)),
            ),
            RequirementKind::Venus | RequirementKind::Unknown(_) => {
                tracing::debug!(kind = requirement.kind.as_str(), "requirement kind not modeled, passing");
                Ok(())
            }
        }
    }

    fn check_parameter(
        &self,
        requirement: &Requirement,
        parameter: GlobalParameter,
        game: &Game,
        player: &Player,
    ) -> Result<()> {
        let widen = self.lenience(player) * self.rules.range(parameter).step;
        check_bounds(
            parameter.as_str(),
            requirement.min.map(|min| min - widen),
            requirement.max.map(|max| max + widen),
            game.global_parameters.get(parameter),
        )
    }

    /// Total lenience granted by the player's static effects, in steps
    pub fn lenience(&self, player: &Player) -> i32 {
        player
            .effects
            .iter()
            .flat_map(|e| e.behavior.static_modifiers())
            .filter(|o| o.kind == ResourceKind::GlobalParameterLenience)
            .map(|o| o.amount)
            .sum()
    }

    /// Occurrences of `tag` across played cards and the corporation
    ///
    /// Cards missing from the catalog count for nothing.
    pub fn count_tags(&self, player: &Player, tag: &Tag) -> i32 {
        let corporation = player
            .corporation
            .as_ref()
            .filter(|corporation| !player.played_cards.contains(corporation));
        player
            .played_cards
            .iter()
            .chain(corporation)
            .map(|card_id| match self.cards.get_card_by_id(card_id) {
                Ok(card) => card.tag_count(tag),
                Err(err) => {
                    tracing::warn!(card = %card_id, error = %err, "skipping card in tag count");
                    0
                }
            })
            .sum()
    }
}

fn check_bounds(label: &str, min: Option<i32>, max: Option<i32>, current: i32) -> Result<()> {
    if let Some(min) = min {
        if current < min {
            return Err(EngineError::RequirementNotMet(format!(
                "{label} requirement not met: need at least {min}, current is {current} (short by {})",
                min - current
            )));
        }
    }
    if let Some(max) = max {
        if current > max {
            return Err(EngineError::RequirementNotMet(format!(
                "{label} requirement not met: need at most {max}, current is {current} (over by {})",
                current - max
            )));
        }
    }
    Ok(())
}

fn check_tag_bounds(tag: &Tag, requirement: &Requirement, count: i32) -> Result<()> {
    if let Some(min) = requirement.min {
        if count < min {
            return Err(EngineError::RequirementNotMet(format!(
                "insufficient {tag} tags: need at least {min}, have {count}"
            )));
        }
    }
    if let Some(max) = requirement.max {
        if count > max {
            return Err(EngineError::RequirementNotMet(format!(
                "too many {tag} tags: need at most {max}, have {count}"
            )));
        }
    }
    Ok(())
}

fn check_production(requirement: &Requirement, production: &ResourceSet) -> Result<()> {
    let resources: Vec<BaseResource> = match &requirement.resource {
        Some(ResourceKind::Resource(r)) | Some(ResourceKind::Production(r)) => vec![*r],
        Some(other) => {
            return Err(EngineError::Unsupported(format!("production requirement on {other}")));
        }
        None => BaseResource::ALL.to_vec(),
    };
    for resource in resources {
        let label = format!("{resource} production");
        check_bounds(&label, requirement.min, requirement.max, production.get(resource))?;
    }
    Ok(())
}

/// Check that production outputs, applied in list order, never push a
/// counter below its floor
///
/// Reductions aimed at other players are not the acting player's concern
/// and are skipped.
pub fn check_production_floors<'a>(
    rules: &RulesConfig,
    production: &ResourceSet,
    outputs: impl IntoIterator<Item = &'a ResourceCondition>,
) -> Result<()> {
    let mut running = *production;
    for output in outputs {
        let ResourceKind::Production(resource) = output.kind else {
            continue;
        };
        if charges_other_player(output) {
            continue;
        }
        running.add(resource, output.amount);
        let floor = rules.production_floor(resource);
        if output.amount < 0 && running.get(resource) < floor {
            return Err(EngineError::InsufficientResources(format!(
                "insufficient {resource} production: would drop to {} (minimum {floor})",
                running.get(resource)
            )));
        }
    }
    Ok(())
}

/// A reduction aimed at another player ("remove 3 plants from any player")
pub(crate) fn charges_other_player(output: &ResourceCondition) -> bool {
    output.amount < 0 && matches!(output.target, Some(Target::Opponent) | Some(Target::AnyPlayer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::core::{Behavior, CardId, CardType, PlayerEffect};
    use crate::repository::InMemoryCardRepository;

    fn validator(cards: Vec<Card>) -> RequirementsValidator {
        RequirementsValidator::new(
            Arc::new(InMemoryCardRepository::new(cards)),
            Arc::new(RulesConfig::default()),
        )
    }

    fn game() -> Game {
        Game::new("g1", Board::hexagon(2))
    }

    #[test]
    fn test_no_requirements_always_pass() {
        let card = Card::new("C1", "Anything", CardType::Automated, 3);
        let result = validator(vec![]).validate(&game(), &Player::new("p1", "Alice"), &card);
        assert!(result.is_ok());
    }

    #[test]
    fn test_oxygen_max_identifies_bound() {
        let mut game = game();
        game.global_parameters.oxygen = 8;
        let card = Card::new("C1", "Algae", CardType::Automated, 10)
            .with_requirement(Requirement::new(RequirementKind::Oxygen).max(5));

        let err = validator(vec![])
            .validate(&game, &Player::new("p1", "Alice"), &card)
            .unwrap_err();
        assert!(matches!(err, EngineError::RequirementNotMet(_)));
        let message = err.to_string();
        assert!(message.contains("oxygen"), "{message}");
        assert!(message.contains("at most 5"), "{message}");
        assert!(message.contains("over by 3"), "{message}");
    }

    #[test]
    fn test_lenience_widens_parameter_bounds() {
        let mut game = game();
        game.global_parameters.temperature = -16;
        let card = Card::new("C1", "Lichen", CardType::Automated, 7)
            .with_requirement(Requirement::new(RequirementKind::Temperature).min(-12));

        let mut player = Player::new("p1", "Alice");
        let v = validator(vec![]);
        assert!(v.validate(&game, &player, &card).is_err());

        player.effects.push(PlayerEffect::new(
            CardId::new("ADAPT"),
            "Adaptation Technology",
            0,
            Behavior::immediate(vec![ResourceCondition::new("global-parameter-lenience", 2)]),
        ));
        assert_eq!(v.lenience(&player), 2);
        // two steps of 2°C
        assert!(v.validate(&game, &player, &card).is_ok());
    }

    #[test]
    fn test_tag_count_includes_corporation() {
        let corp = Card::new("CORP", "Science Corp", CardType::Corporation, 0).with_tags([Tag::Science]);
        let lab = Card::new("LAB", "Lab", CardType::Automated, 5).with_tags([Tag::Science, Tag::Science]);
        let v = validator(vec![corp, lab]);

        let mut player = Player::new("p1", "Alice");
        player.corporation = Some(CardId::new("CORP"));
        player.played_cards.push(CardId::new("LAB"));
        assert_eq!(v.count_tags(&player, &Tag::Science), 3);

        let card = Card::new("C1", "Research", CardType::Automated, 5)
            .with_requirement(Requirement::new(RequirementKind::Tags).min(4).tag(Tag::Science));
        let err = v.validate(&game(), &player, &card).unwrap_err();
        assert!(err.to_string().contains("insufficient science tags"));
    }

    #[test]
    fn test_tag_count_skips_cards_missing_from_catalog() {
        let lab = Card::new("LAB", "Lab", CardType::Automated, 5).with_tags([Tag::Science]);
        let v = validator(vec![lab]);

        let mut player = Player::new("p1", "Alice");
        player.corporation = Some(CardId::new("GONE-CORP"));
        player.played_cards = vec![CardId::new("GONE"), CardId::new("LAB")];
        assert_eq!(v.count_tags(&player, &Tag::Science), 1);

        let card = Card::new("C1", "Research", CardType::Automated, 5)
            .with_requirement(Requirement::new(RequirementKind::Tags).min(1).tag(Tag::Science));
        assert!(v.validate(&game(), &player, &card).is_ok());
    }

    #[test]
    fn test_tag_requirement_without_tag_fails_open() {
        let card = Card::new("C1", "Loose", CardType::Automated, 5)
            .with_requirement(Requirement::new(RequirementKind::Tags).min(1));
        assert!(validator(vec![])
            .validate(&game(), &Player::new("p1", "Alice"), &card)
            .is_ok());
    }

    #[test]
    fn test_storage_resource_requirement_fails_open() {
        let card = Card::new("C1", "Decomposers", CardType::Automated, 5).with_requirement(
            Requirement::new(RequirementKind::Resource)
                .min(3)
                .resource(ResourceKind::from("microbes".to_string())),
        );
        let player = Player::new("p1", "Alice");
        assert!(validator(vec![]).validate(&game(), &player, &card).is_ok());

        // Pool resources are still checked
        let plants = Card::new("C2", "Herbivores", CardType::Automated, 5).with_requirement(
            Requirement::new(RequirementKind::Resource)
                .min(3)
                .resource(ResourceKind::Resource(BaseResource::Plants)),
        );
        let err = validator(vec![]).validate(&game(), &player, &plants).unwrap_err();
        assert!(matches!(err, EngineError::RequirementNotMet(_)));
    }

    #[test]
    fn test_production_requirement_checks_each_counter() {
        let player = Player::new("p1", "Alice")
            .with_production(ResourceSet::new().with(BaseResource::Energy, 1));
        let v = validator(vec![]);

        let energy = Card::new("C1", "Grid", CardType::Automated, 5).with_requirement(
            Requirement::new(RequirementKind::Production)
                .min(1)
                .resource(ResourceKind::Resource(BaseResource::Energy)),
        );
        assert!(v.validate(&game(), &player, &energy).is_ok());

        // Unqualified: every counter must reach the bound
        let all = Card::new("C2", "Balanced", CardType::Automated, 5)
            .with_requirement(Requirement::new(RequirementKind::Production).min(1));
        let err = v.validate(&game(), &player, &all).unwrap_err();
        assert!(err.to_string().contains("credits production"));
    }

    #[test]
    fn test_unknown_requirement_fails_open() {
        let card = Card::new("C1", "Venus Thing", CardType::Automated, 5)
            .with_requirement(Requirement::new(RequirementKind::Venus).min(10))
            .with_requirement(Requirement::new(RequirementKind::from("colonies".to_string())).min(1));
        assert!(validator(vec![])
            .validate(&game(), &Player::new("p1", "Alice"), &card)
            .is_ok());
    }

    #[test]
    fn test_production_floor_runs_in_output_order() {
        let rules = RulesConfig::default();
        let production = ResourceSet::new().with(BaseResource::Credits, -4);
        let drop_two = ResourceCondition::new("credits-production", -2);
        let gain_three = ResourceCondition::new("credits-production", 3);

        // -4 - 2 = -6 breaks the floor before the gain is counted
        let err = check_production_floors(&rules, &production, [&drop_two, &gain_three]).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientResources(_)));
        assert!(check_production_floors(&rules, &production, [&gain_three, &drop_two]).is_ok());

        let opponent = ResourceCondition::new("plants-production", -1).with_target(Target::Opponent);
        assert!(check_production_floors(&rules, &ResourceSet::new(), [&opponent]).is_ok());
    }
}
