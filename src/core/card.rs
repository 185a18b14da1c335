//! Card types and definitions
//!
//! A [`Card`] is immutable catalog data. Its effects are described by an
//! ordered list of [`Behavior`]s, each classified by its first trigger into
//! one of the shapes in [`BehaviorShape`].

use crate::core::{CardId, ResourceKind, Tag};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Corporation,
    Automated,
    Active,
    Event,
    Prelude,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardType::Corporation => "corporation",
            CardType::Automated => "automated",
            CardType::Active => "active",
            CardType::Event => "event",
            CardType::Prelude => "prelude",
        };
        write!(f, "{s}")
    }
}

/// Where a condition or requirement applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    Anywhere,
    Mars,
    #[serde(other)]
    Other,
}

/// Targeting scope of a resource line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    SelfPlayer,
    SelfCard,
    AnyCard,
    AnyPlayer,
    Opponent,
    Any,
    None,
}

/// How a behavior is fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    Auto,
    Manual,
    AutoCorporationFirstAction,
    AutoCorporationStart,
}

/// Event condition that refines an auto trigger into a passive effect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerConditionKind {
    OceanPlaced,
    TemperatureRaise,
    OxygenRaise,
    CityPlaced,
    GreeneryPlaced,
    TilePlaced,
    CardPlayed,
    TagPlayed,
    PlacementBonusGained,
    Unknown(String),
}

impl TriggerConditionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TriggerConditionKind::OceanPlaced => "ocean-placed",
            TriggerConditionKind::TemperatureRaise => "temperature-raise",
            TriggerConditionKind::OxygenRaise => "oxygen-raise",
            TriggerConditionKind::CityPlaced => "city-placed",
            TriggerConditionKind::GreeneryPlaced => "greenery-placed",
            TriggerConditionKind::TilePlaced => "tile-placed",
            TriggerConditionKind::CardPlayed => "card-played",
            TriggerConditionKind::TagPlayed => "tag-played",
            TriggerConditionKind::PlacementBonusGained => "placement-bonus-gained",
            TriggerConditionKind::Unknown(s) => s,
        }
    }
}

impl From<String> for TriggerConditionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ocean-placed" => TriggerConditionKind::OceanPlaced,
            "temperature-raise" => TriggerConditionKind::TemperatureRaise,
            "oxygen-raise" => TriggerConditionKind::OxygenRaise,
            "city-placed" => TriggerConditionKind::CityPlaced,
            "greenery-placed" => TriggerConditionKind::GreeneryPlaced,
            "tile-placed" => TriggerConditionKind::TilePlaced,
            "card-played" => TriggerConditionKind::CardPlayed,
            "tag-played" => TriggerConditionKind::TagPlayed,
            "placement-bonus-gained" => TriggerConditionKind::PlacementBonusGained,
            _ => TriggerConditionKind::Unknown(s),
        }
    }
}

impl From<TriggerConditionKind> for String {
    fn from(kind: TriggerConditionKind) -> Self {
        match kind {
            TriggerConditionKind::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCondition {
    #[serde(rename = "type")]
    pub kind: TriggerConditionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// For tag-played: only cards carrying one of these tags qualify
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_tags: Vec<Tag>,
    /// For placement-bonus-gained: only bonuses containing one of these qualify
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_resources: Vec<ResourceKind>,
}

impl TriggerCondition {
    pub fn new(kind: TriggerConditionKind) -> Self {
        TriggerCondition {
            kind,
            location: None,
            affected_tags: Vec::new(),
            affected_resources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<TriggerCondition>,
}

/// Scaling of an amount by a countable quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCondition {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub amount: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

/// A single input or output line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCondition {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub amount: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_resources: Vec<ResourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per: Option<PerCondition>,
}

impl ResourceCondition {
    pub fn new(kind: impl Into<ResourceKind>, amount: i32) -> Self {
        ResourceCondition {
            kind: kind.into(),
            amount,
            target: None,
            affected_tags: Vec::new(),
            affected_resources: Vec::new(),
            per: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_affected_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.affected_tags = tags.into_iter().collect();
        self
    }
}

/// Alternative {inputs, outputs} bundle on a behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ResourceCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ResourceCondition>,
}

/// What a behavior turns into once its card is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorShape {
    /// Applied once, synchronously, at play time
    Immediate,
    /// Registered as a repeatable player action
    Manual,
    /// Registered as an event-driven player effect
    Passive,
    /// Consumed by the forced first action flow only
    CorporationFirstAction,
    /// No triggers at all; nothing to do
    Inert,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behavior {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ResourceCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<ResourceCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Behavior {
    fn with_trigger(trigger_type: TriggerType, condition: Option<TriggerCondition>) -> Self {
        Behavior {
            triggers: vec![Trigger {
                trigger_type,
                condition,
            }],
            ..Default::default()
        }
    }

    /// Auto trigger without condition
    pub fn immediate(outputs: Vec<ResourceCondition>) -> Self {
        Behavior {
            outputs,
            ..Self::with_trigger(TriggerType::Auto, None)
        }
    }

    pub fn manual(inputs: Vec<ResourceCondition>, outputs: Vec<ResourceCondition>) -> Self {
        Behavior {
            inputs,
            outputs,
            ..Self::with_trigger(TriggerType::Manual, None)
        }
    }

    /// Auto trigger refined by an event condition
    pub fn passive(condition: TriggerCondition, outputs: Vec<ResourceCondition>) -> Self {
        Behavior {
            outputs,
            ..Self::with_trigger(TriggerType::Auto, Some(condition))
        }
    }

    pub fn corporation_start(outputs: Vec<ResourceCondition>) -> Self {
        Behavior {
            outputs,
            ..Self::with_trigger(TriggerType::AutoCorporationStart, None)
        }
    }

    pub fn corporation_first_action(output: ResourceCondition) -> Self {
        Behavior {
            outputs: vec![output],
            ..Self::with_trigger(TriggerType::AutoCorporationFirstAction, None)
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    /// The classifying trigger
    pub fn primary_trigger(&self) -> Option<&Trigger> {
        self.triggers.first()
    }

    pub fn condition(&self) -> Option<&TriggerCondition> {
        self.primary_trigger().and_then(|t| t.condition.as_ref())
    }

    /// Classify the behavior by its first trigger
    pub fn shape(&self) -> BehaviorShape {
        match self.primary_trigger() {
            None => BehaviorShape::Inert,
            Some(trigger) => match (trigger.trigger_type, &trigger.condition) {
                (TriggerType::Manual, _) => BehaviorShape::Manual,
                (TriggerType::Auto, Some(_)) => BehaviorShape::Passive,
                (TriggerType::Auto, None) | (TriggerType::AutoCorporationStart, _) => {
                    BehaviorShape::Immediate
                }
                (TriggerType::AutoCorporationFirstAction, _) => {
                    BehaviorShape::CorporationFirstAction
                }
            },
        }
    }

    /// Outputs that are standing modifiers (discounts, lenience, ...)
    pub fn static_modifiers(&self) -> impl Iterator<Item = &ResourceCondition> {
        self.outputs.iter().filter(|o| o.kind.is_static_modifier())
    }

    pub fn has_static_modifiers(&self) -> bool {
        self.static_modifiers().next().is_some()
    }

    /// The selected choice, if the index is in range
    pub fn choice(&self, index: Option<usize>) -> Option<&Choice> {
        index.and_then(|i| self.choices.get(i))
    }

    /// Base outputs followed by the selected choice's outputs
    pub fn outputs_with_choice(&self, index: Option<usize>) -> Vec<&ResourceCondition> {
        let mut outputs: Vec<&ResourceCondition> = self.outputs.iter().collect();
        if let Some(choice) = self.choice(index) {
            outputs.extend(choice.outputs.iter());
        }
        outputs
    }

    /// Base inputs followed by the selected choice's inputs
    pub fn inputs_with_choice(&self, index: Option<usize>) -> Vec<&ResourceCondition> {
        let mut inputs: Vec<&ResourceCondition> = self.inputs.iter().collect();
        if let Some(choice) = self.choice(index) {
            inputs.extend(choice.inputs.iter());
        }
        inputs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequirementKind {
    Temperature,
    Oxygen,
    Oceans,
    Venus,
    Cities,
    Greeneries,
    Tags,
    Production,
    TerraformRating,
    Resource,
    Unknown(String),
}

impl RequirementKind {
    pub fn as_str(&self) -> &str {
        match self {
            RequirementKind::Temperature => "temperature",
            RequirementKind::Oxygen => "oxygen",
            RequirementKind::Oceans => "oceans",
            RequirementKind::Venus => "venus",
            RequirementKind::Cities => "cities",
            RequirementKind::Greeneries => "greeneries",
            RequirementKind::Tags => "tags",
            RequirementKind::Production => "production",
            RequirementKind::TerraformRating => "tr",
            RequirementKind::Resource => "resource",
            RequirementKind::Unknown(s) => s,
        }
    }
}

impl From<String> for RequirementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "temperature" => RequirementKind::Temperature,
            "oxygen" => RequirementKind::Oxygen,
            "oceans" => RequirementKind::Oceans,
            "venus" => RequirementKind::Venus,
            "cities" => RequirementKind::Cities,
            "greeneries" => RequirementKind::Greeneries,
            "tags" => RequirementKind::Tags,
            "production" => RequirementKind::Production,
            "tr" => RequirementKind::TerraformRating,
            "resource" => RequirementKind::Resource,
            _ => RequirementKind::Unknown(s),
        }
    }
}

impl From<RequirementKind> for String {
    fn from(kind: RequirementKind) -> Self {
        match kind {
            RequirementKind::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// A single play requirement with inclusive bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceKind>,
}

impl Requirement {
    pub fn new(kind: RequirementKind) -> Self {
        Requirement {
            kind,
            min: None,
            max: None,
            location: None,
            tag: None,
            resource: None,
        }
    }

    pub fn min(mut self, min: i32) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn resource(mut self, resource: ResourceKind) -> Self {
        self.resource = Some(resource);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VpConditionKind {
    Fixed,
    Once,
    Per,
    Unknown(String),
}

impl From<String> for VpConditionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "fixed" => VpConditionKind::Fixed,
            "once" => VpConditionKind::Once,
            "per" => VpConditionKind::Per,
            _ => VpConditionKind::Unknown(s),
        }
    }
}

impl From<VpConditionKind> for String {
    fn from(kind: VpConditionKind) -> Self {
        match kind {
            VpConditionKind::Fixed => "fixed".to_string(),
            VpConditionKind::Once => "once".to_string(),
            VpConditionKind::Per => "per".to_string(),
            VpConditionKind::Unknown(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpCondition {
    pub amount: i32,
    pub condition: VpConditionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_trigger: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per: Option<PerCondition>,
}

impl VpCondition {
    pub fn fixed(amount: i32) -> Self {
        VpCondition {
            amount,
            condition: VpConditionKind::Fixed,
            max_trigger: None,
            per: None,
        }
    }
}

/// Token pool declared by a card (animals, microbes, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStorage {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub starting: i32,
}

/// A catalog card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,

    pub name: String,

    #[serde(rename = "type")]
    pub card_type: CardType,

    /// Printed cost in credits
    #[serde(default)]
    pub cost: i32,

    #[serde(default)]
    pub description: String,

    /// Tags (order irrelevant, duplicates count)
    #[serde(default)]
    pub tags: SmallVec<[Tag; 2]>,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(default)]
    pub behaviors: Vec<Behavior>,

    #[serde(default)]
    pub vp_conditions: Vec<VpCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_storage: Option<ResourceStorage>,
}

impl Card {
    pub fn new(id: impl Into<CardId>, name: impl Into<String>, card_type: CardType, cost: i32) -> Self {
        Card {
            id: id.into(),
            name: name.into(),
            card_type,
            cost,
            description: String::new(),
            tags: SmallVec::new(),
            requirements: Vec::new(),
            behaviors: Vec::new(),
            vp_conditions: Vec::new(),
            resource_storage: None,
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn with_vp(mut self, vp: VpCondition) -> Self {
        self.vp_conditions.push(vp);
        self
    }

    pub fn with_storage(mut self, kind: ResourceKind, starting: i32) -> Self {
        self.resource_storage = Some(ResourceStorage {
            kind,
            capacity: None,
            starting,
        });
        self
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Number of occurrences of a tag on this card
    pub fn tag_count(&self, tag: &Tag) -> i32 {
        self.tags.iter().filter(|t| *t == tag).count() as i32
    }

    pub fn is_corporation(&self) -> bool {
        self.card_type == CardType::Corporation
    }

    /// Behaviors paired with their index, filtered by shape
    pub fn behaviors_with_shape(
        &self,
        shape: BehaviorShape,
    ) -> impl Iterator<Item = (usize, &Behavior)> {
        self.behaviors
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.shape() == shape)
    }

    /// Whether any behavior offers choices
    pub fn has_choices(&self) -> bool {
        self.behaviors.iter().any(|b| !b.choices.is_empty())
    }

    /// Catalog terms the engine does not model, prefixed by where they appear
    ///
    /// These are the fail-open kinds: the engine skips them with a log line
    /// instead of rejecting the card.
    pub fn unknown_vocabulary(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        for tag in self.tags.iter().filter(|t| t.is_unknown()) {
            unknown.push(format!("tag:{tag}"));
        }
        for requirement in &self.requirements {
            if let RequirementKind::Unknown(kind) = &requirement.kind {
                unknown.push(format!("requirement:{kind}"));
            }
        }
        for behavior in &self.behaviors {
            if let Some(TriggerConditionKind::Unknown(kind)) = behavior.condition().map(|c| &c.kind) {
                unknown.push(format!("condition:{kind}"));
            }
            let choice_items = behavior.choices.iter().flat_map(|c| c.inputs.iter().chain(&c.outputs));
            for item in behavior.inputs.iter().chain(&behavior.outputs).chain(choice_items) {
                if let ResourceKind::Unknown(kind) = &item.kind {
                    unknown.push(format!("resource:{kind}"));
                }
            }
        }
        for vp in &self.vp_conditions {
            if let VpConditionKind::Unknown(kind) = &vp.condition {
                unknown.push(format!("vp:{kind}"));
            }
        }
        unknown.sort();
        unknown.dedup();
        unknown
    }
}
