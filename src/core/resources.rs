//! Resource vocabulary and resource counters
//!
//! Catalog data names resources with kebab-case strings ("credits",
//! "steel-production", "city-placement", ...). They are parsed once into the
//! closed [`ResourceKind`] union; anything the engine does not model is kept
//! as [`ResourceKind::Unknown`] so the interpreter can apply its fail-open
//! policy without string matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six base resources held by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseResource {
    Credits,
    Steel,
    Titanium,
    Plants,
    Energy,
    Heat,
}

impl BaseResource {
    pub const ALL: [BaseResource; 6] = [
        BaseResource::Credits,
        BaseResource::Steel,
        BaseResource::Titanium,
        BaseResource::Plants,
        BaseResource::Energy,
        BaseResource::Heat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseResource::Credits => "credits",
            BaseResource::Steel => "steel",
            BaseResource::Titanium => "titanium",
            BaseResource::Plants => "plants",
            BaseResource::Energy => "energy",
            BaseResource::Heat => "heat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        BaseResource::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for BaseResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token kinds that live on cards rather than in the player's pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageResource {
    Animals,
    Microbes,
    Floaters,
    Science,
    Asteroid,
    Disease,
}

impl StorageResource {
    pub const ALL: [StorageResource; 6] = [
        StorageResource::Animals,
        StorageResource::Microbes,
        StorageResource::Floaters,
        StorageResource::Science,
        StorageResource::Asteroid,
        StorageResource::Disease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageResource::Animals => "animals",
            StorageResource::Microbes => "microbes",
            StorageResource::Floaters => "floaters",
            StorageResource::Science => "science",
            StorageResource::Asteroid => "asteroid",
            StorageResource::Disease => "disease",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        StorageResource::ALL.into_iter().find(|r| r.as_str() == s)
    }
}

/// Shared, clamped, game-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalParameter {
    Temperature,
    Oxygen,
    Oceans,
}

impl GlobalParameter {
    pub const ALL: [GlobalParameter; 3] = [
        GlobalParameter::Temperature,
        GlobalParameter::Oxygen,
        GlobalParameter::Oceans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalParameter::Temperature => "temperature",
            GlobalParameter::Oxygen => "oxygen",
            GlobalParameter::Oceans => "oceans",
        }
    }
}

impl fmt::Display for GlobalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tiles a card can ask the player to place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileKind {
    City,
    Ocean,
    Greenery,
}

impl TileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileKind::City => "city",
            TileKind::Ocean => "ocean",
            TileKind::Greenery => "greenery",
        }
    }

    /// Parse a tile name as it appears in events and selections.
    /// Accepts both the short form ("city") and the tile form ("city-tile").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "city" | "city-tile" => Some(TileKind::City),
            "ocean" | "ocean-tile" => Some(TileKind::Ocean),
            "greenery" | "greenery-tile" => Some(TileKind::Greenery),
            _ => None,
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of an input/output line item on a behavior
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Resource(BaseResource),
    Production(BaseResource),
    TerraformRating,
    /// A request to place a tile ("city-placement")
    TilePlacement(TileKind),
    /// A count of tiles on the board ("city-tile"), used by per-conditions
    Tile(TileKind),
    CardStorage(StorageResource),
    GlobalParameter(GlobalParameter),
    Discount,
    GlobalParameterLenience,
    ValueModifier,
    Defense,
    PaymentSubstitute,
    CardDraw,
    CardTake,
    CardPeek,
    Unknown(String),
}

impl ResourceKind {
    pub fn as_string(&self) -> String {
        match self {
            ResourceKind::Resource(r) => r.as_str().to_string(),
            ResourceKind::Production(r) => format!("{}-production", r.as_str()),
            ResourceKind::TerraformRating => "tr".to_string(),
            ResourceKind::TilePlacement(t) => format!("{}-placement", t.as_str()),
            ResourceKind::Tile(t) => format!("{}-tile", t.as_str()),
            ResourceKind::CardStorage(s) => s.as_str().to_string(),
            ResourceKind::GlobalParameter(p) => p.as_str().to_string(),
            ResourceKind::Discount => "discount".to_string(),
            ResourceKind::GlobalParameterLenience => "global-parameter-lenience".to_string(),
            ResourceKind::ValueModifier => "value-modifier".to_string(),
            ResourceKind::Defense => "defense".to_string(),
            ResourceKind::PaymentSubstitute => "payment-substitute".to_string(),
            ResourceKind::CardDraw => "card-draw".to_string(),
            ResourceKind::CardTake => "card-take".to_string(),
            ResourceKind::CardPeek => "card-peek".to_string(),
            ResourceKind::Unknown(s) => s.clone(),
        }
    }

    /// Meta kinds that describe a standing modifier rather than a delta
    pub fn is_static_modifier(&self) -> bool {
        matches!(
            self,
            ResourceKind::Discount
                | ResourceKind::GlobalParameterLenience
                | ResourceKind::ValueModifier
                | ResourceKind::Defense
                | ResourceKind::PaymentSubstitute
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ResourceKind::Unknown(_))
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        if let Some(base) = BaseResource::parse(&s) {
            return ResourceKind::Resource(base);
        }
        if let Some(base) = s.strip_suffix("-production").and_then(BaseResource::parse) {
            return ResourceKind::Production(base);
        }
        if let Some(storage) = StorageResource::parse(&s) {
            return ResourceKind::CardStorage(storage);
        }
        match s.as_str() {
            "tr" => ResourceKind::TerraformRating,
            "city-placement" => ResourceKind::TilePlacement(TileKind::City),
            "ocean-placement" => ResourceKind::TilePlacement(TileKind::Ocean),
            "greenery-placement" => ResourceKind::TilePlacement(TileKind::Greenery),
            "city-tile" => ResourceKind::Tile(TileKind::City),
            "ocean-tile" => ResourceKind::Tile(TileKind::Ocean),
            "greenery-tile" => ResourceKind::Tile(TileKind::Greenery),
            "temperature" => ResourceKind::GlobalParameter(GlobalParameter::Temperature),
            "oxygen" => ResourceKind::GlobalParameter(GlobalParameter::Oxygen),
            "oceans" => ResourceKind::GlobalParameter(GlobalParameter::Oceans),
            "discount" => ResourceKind::Discount,
            "global-parameter-lenience" => ResourceKind::GlobalParameterLenience,
            "value-modifier" => ResourceKind::ValueModifier,
            "defense" => ResourceKind::Defense,
            "payment-substitute" => ResourceKind::PaymentSubstitute,
            "card-draw" => ResourceKind::CardDraw,
            "card-take" => ResourceKind::CardTake,
            "card-peek" => ResourceKind::CardPeek,
            _ => ResourceKind::Unknown(s),
        }
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        ResourceKind::from(s.to_string())
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_string()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Six signed counters, one per base resource
///
/// Used both for a player's resource pool and for production; the same
/// shape also carries deltas while effects are being staged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub credits: i32,
    pub steel: i32,
    pub titanium: i32,
    pub plants: i32,
    pub energy: i32,
    pub heat: i32,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: BaseResource) -> i32 {
        match resource {
            BaseResource::Credits => self.credits,
            BaseResource::Steel => self.steel,
            BaseResource::Titanium => self.titanium,
            BaseResource::Plants => self.plants,
            BaseResource::Energy => self.energy,
            BaseResource::Heat => self.heat,
        }
    }

    pub fn get_mut(&mut self, resource: BaseResource) -> &mut i32 {
        match resource {
            BaseResource::Credits => &mut self.credits,
            BaseResource::Steel => &mut self.steel,
            BaseResource::Titanium => &mut self.titanium,
            BaseResource::Plants => &mut self.plants,
            BaseResource::Energy => &mut self.energy,
            BaseResource::Heat => &mut self.heat,
        }
    }

    pub fn add(&mut self, resource: BaseResource, amount: i32) {
        *self.get_mut(resource) += amount;
    }

    /// Builder-style helper, mostly for setting up players
    pub fn with(mut self, resource: BaseResource, amount: i32) -> Self {
        self.add(resource, amount);
        self
    }

    pub fn apply_delta(&mut self, delta: &ResourceSet) {
        for r in BaseResource::ALL {
            self.add(r, delta.get(r));
        }
    }

    pub fn is_zero(&self) -> bool {
        BaseResource::ALL.iter().all(|r| self.get(*r) == 0)
    }

    /// Iterate over (resource, amount) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (BaseResource, i32)> + '_ {
        BaseResource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    /// First counter that would drop below zero after applying `delta`
    pub fn first_shortfall(&self, delta: &ResourceSet) -> Option<(BaseResource, i32, i32)> {
        self.iter().find_map(|(r, have)| {
            let after = have + delta.get(r);
            (after < 0).then_some((r, have, -delta.get(r)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!(
            ResourceKind::from("credits"),
            ResourceKind::Resource(BaseResource::Credits)
        );
        assert_eq!(
            ResourceKind::from("heat-production"),
            ResourceKind::Production(BaseResource::Heat)
        );
        assert_eq!(
            ResourceKind::from("ocean-placement"),
            ResourceKind::TilePlacement(TileKind::Ocean)
        );
        assert_eq!(
            ResourceKind::from("microbes"),
            ResourceKind::CardStorage(StorageResource::Microbes)
        );
        assert_eq!(ResourceKind::from("tr"), ResourceKind::TerraformRating);
        assert_eq!(
            ResourceKind::from("venus"),
            ResourceKind::Unknown("venus".to_string())
        );
    }

    #[test]
    fn test_resource_kind_string_form_is_stable() {
        for raw in [
            "steel-production",
            "greenery-placement",
            "city-tile",
            "oxygen",
            "global-parameter-lenience",
            "card-draw",
            "colony-tile",
        ] {
            assert_eq!(ResourceKind::from(raw).as_string(), raw);
        }
    }

    #[test]
    fn test_static_modifier_kinds() {
        assert!(ResourceKind::Discount.is_static_modifier());
        assert!(ResourceKind::PaymentSubstitute.is_static_modifier());
        assert!(!ResourceKind::Resource(BaseResource::Heat).is_static_modifier());
    }

    #[test]
    fn test_resource_set_shortfall() {
        let pool = ResourceSet::new()
            .with(BaseResource::Credits, 10)
            .with(BaseResource::Steel, 1);
        let mut cost = ResourceSet::new();
        cost.add(BaseResource::Credits, -8);
        assert_eq!(pool.first_shortfall(&cost), None);

        cost.add(BaseResource::Steel, -2);
        assert_eq!(
            pool.first_shortfall(&cost),
            Some((BaseResource::Steel, 1, 2))
        );
    }

    #[test]
    fn test_apply_delta() {
        let mut pool = ResourceSet::new().with(BaseResource::Plants, 3);
        let delta = ResourceSet::new()
            .with(BaseResource::Plants, -1)
            .with(BaseResource::Energy, 2);
        pool.apply_delta(&delta);
        assert_eq!(pool.plants, 2);
        assert_eq!(pool.energy, 2);
        assert!(!pool.is_zero());
        assert!(ResourceSet::new().is_zero());
    }
}
