//! Ruleset configuration
//!
//! Everything numeric that the reference ruleset fixes (parameter ranges,
//! metal values, production floors) lives here so a session can run a
//! variant ruleset without code changes.

use crate::core::{BaseResource, GlobalParameter};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bounds and step size of one global parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: i32,
    pub max: i32,
    /// Units per step (2 for temperature: one step is 2°C)
    pub step: i32,
}

impl ParameterRange {
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesConfig {
    pub temperature: ParameterRange,
    pub oxygen: ParameterRange,
    pub oceans: ParameterRange,
    pub steel_value: i32,
    pub titanium_value: i32,
    pub min_credits_production: i32,
    pub min_other_production: i32,
    /// Award 1 TR for every step a global parameter actually advances
    pub terraform_rating_per_step: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            temperature: ParameterRange { min: -30, max: 8, step: 2 },
            oxygen: ParameterRange { min: 0, max: 14, step: 1 },
            oceans: ParameterRange { min: 0, max: 9, step: 1 },
            steel_value: 2,
            titanium_value: 3,
            min_credits_production: -5,
            min_other_production: 0,
            terraform_rating_per_step: true,
        }
    }
}

impl RulesConfig {
    pub fn range(&self, parameter: GlobalParameter) -> &ParameterRange {
        match parameter {
            GlobalParameter::Temperature => &self.temperature,
            GlobalParameter::Oxygen => &self.oxygen,
            GlobalParameter::Oceans => &self.oceans,
        }
    }

    /// Lowest value a production counter may be reduced to
    pub fn production_floor(&self, resource: BaseResource) -> i32 {
        match resource {
            BaseResource::Credits => self.min_credits_production,
            _ => self.min_other_production,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
