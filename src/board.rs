//! Hex board: tile occupancy and placement legality
//!
//! Board generation is done elsewhere; this module only answers "where may
//! this tile go" and records placements. Hexes are kept in a `Vec` so legal
//! hex enumeration is deterministic.

use crate::core::{BaseResource, PlayerId, ResourceSet, TileKind};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cube coordinates (q + r + s == 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        HexCoord { q, r, s: -q - r }
    }

    pub fn neighbors(&self) -> [HexCoord; 6] {
        const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];
        DIRECTIONS.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    pub fn is_adjacent(&self, other: &HexCoord) -> bool {
        self.neighbors().contains(other)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.q, self.r, self.s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HexKind {
    Land,
    /// Reserved for ocean tiles only
    OceanReserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub tile: TileKind,
    pub owner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    pub coord: HexCoord,
    pub kind: HexKind,
    pub occupant: Option<Occupant>,
    /// Printed placement bonus
    #[serde(default)]
    pub bonus: ResourceSet,
}

impl Hex {
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn owned_by(&self, player: &PlayerId) -> bool {
        self.occupant
            .as_ref()
            .and_then(|o| o.owner.as_ref())
            .map(|owner| owner == player)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    hexes: Vec<Hex>,
}

impl Board {
    pub fn empty() -> Self {
        Board { hexes: Vec::new() }
    }

    /// All-land hexagonal board of the given radius
    pub fn hexagon(radius: i32) -> Self {
        let mut hexes = Vec::new();
        for q in -radius..=radius {
            let r_min = (-radius).max(-q - radius);
            let r_max = radius.min(-q + radius);
            for r in r_min..=r_max {
                hexes.push(Hex {
                    coord: HexCoord::new(q, r),
                    kind: HexKind::Land,
                    occupant: None,
                    bonus: ResourceSet::default(),
                });
            }
        }
        Board { hexes }
    }

    pub fn with_ocean_reserved(mut self, coords: impl IntoIterator<Item = HexCoord>) -> Self {
        for coord in coords {
            if let Some(hex) = self.hex_mut(&coord) {
                hex.kind = HexKind::OceanReserved;
            }
        }
        self
    }

    pub fn with_bonus(mut self, coord: HexCoord, resource: BaseResource, amount: i32) -> Self {
        if let Some(hex) = self.hex_mut(&coord) {
            hex.bonus.add(resource, amount);
        }
        self
    }

    pub fn hexes(&self) -> &[Hex] {
        &self.hexes
    }

    pub fn hex(&self, coord: &HexCoord) -> Option<&Hex> {
        self.hexes.iter().find(|h| &h.coord == coord)
    }

    fn hex_mut(&mut self, coord: &HexCoord) -> Option<&mut Hex> {
        self.hexes.iter_mut().find(|h| &h.coord == coord)
    }

    pub fn count_tiles(&self, tile: TileKind, owner: Option<&PlayerId>) -> i32 {
        self.hexes
            .iter()
            .filter(|h| match &h.occupant {
                Some(o) if o.tile == tile => owner.map(|p| o.owner.as_ref() == Some(p)).unwrap_or(true),
                _ => false,
            })
            .count() as i32
    }

    /// Hexes where `player` may legally place `tile`, in board order
    ///
    /// - city: any empty land hex
    /// - greenery: empty land adjacent to one of the player's tiles, or any
    ///   empty land hex if the player owns no tiles yet
    /// - ocean: any empty ocean-reserved hex
    pub fn legal_hexes(&self, tile: TileKind, player: &PlayerId) -> Vec<HexCoord> {
        let empty_land = self
            .hexes
            .iter()
            .filter(|h| h.is_empty() && h.kind == HexKind::Land);

        match tile {
            TileKind::City => empty_land.map(|h| h.coord).collect(),
            TileKind::Ocean => self
                .hexes
                .iter()
                .filter(|h| h.is_empty() && h.kind == HexKind::OceanReserved)
                .map(|h| h.coord)
                .collect(),
            TileKind::Greenery => {
                let owned: Vec<HexCoord> = self
                    .hexes
                    .iter()
                    .filter(|h| h.owned_by(player))
                    .map(|h| h.coord)
                    .collect();
                if owned.is_empty() {
                    return empty_land.map(|h| h.coord).collect();
                }
                empty_land
                    .filter(|h| owned.iter().any(|o| o.is_adjacent(&h.coord)))
                    .map(|h| h.coord)
                    .collect()
            }
        }
    }

    /// Put a tile on a hex and return the hex's placement bonus
    pub fn occupy(&mut self, coord: HexCoord, tile: TileKind, owner: Option<PlayerId>) -> Result<ResourceSet> {
        let hex = self
            .hex_mut(&coord)
            .ok_or_else(|| EngineError::InvalidSelection(format!("hex {coord} is not on the board")))?;

        if let Some(occupant) = &hex.occupant {
            return Err(EngineError::InvalidSelection(format!(
                "hex {coord} is already occupied by a {} tile",
                occupant.tile
            )));
        }

        let ocean_hex = hex.kind == HexKind::OceanReserved;
        if ocean_hex != (tile == TileKind::Ocean) {
            return Err(EngineError::InvalidSelection(format!(
                "{tile} tile cannot be placed on hex {coord}"
            )));
        }

        hex.occupant = Some(Occupant { tile, owner });
        Ok(hex.bonus)
    }
}
