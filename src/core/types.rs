//! Strongly-typed wrappers for game concepts
//!
//! Identifiers for games, players and cards are all strings on the wire.
//! They are wrapped in distinct newtypes so a card id can never be passed
//! where a player id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a single game instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(s: impl Into<String>) -> Self {
        GameId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GameId {
    fn from(s: String) -> Self {
        GameId(s)
    }
}

impl From<&str> for GameId {
    fn from(s: &str) -> Self {
        GameId(s.to_string())
    }
}

/// Identifier of a player, unique within a game
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId(s)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_string())
    }
}

/// Catalog identifier of a card (e.g. "B07", "CORP-3")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(s: impl Into<String>) -> Self {
        CardId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CardId {
    fn from(s: String) -> Self {
        CardId(s)
    }
}

impl From<&str> for CardId {
    fn from(s: &str) -> Self {
        CardId(s.to_string())
    }
}

/// Card tag
///
/// Tags printed on cards. Catalog data may carry tags the engine does not
/// model yet; those are preserved verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tag {
    Space,
    Earth,
    Science,
    Power,
    Building,
    Microbe,
    Animal,
    Plant,
    Event,
    City,
    Venus,
    Jovian,
    Wildlife,
    Wild,
    Unknown(String),
}

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Space => "space",
            Tag::Earth => "earth",
            Tag::Science => "science",
            Tag::Power => "power",
            Tag::Building => "building",
            Tag::Microbe => "microbe",
            Tag::Animal => "animal",
            Tag::Plant => "plant",
            Tag::Event => "event",
            Tag::City => "city",
            Tag::Venus => "venus",
            Tag::Jovian => "jovian",
            Tag::Wildlife => "wildlife",
            Tag::Wild => "wild",
            Tag::Unknown(s) => s,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Tag::Unknown(_))
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        match s.as_str() {
            "space" => Tag::Space,
            "earth" => Tag::Earth,
            "science" => Tag::Science,
            "power" => Tag::Power,
            "building" => Tag::Building,
            "microbe" => Tag::Microbe,
            "animal" => Tag::Animal,
            "plant" => Tag::Plant,
            "event" => Tag::Event,
            "city" => Tag::City,
            "venus" => Tag::Venus,
            "jovian" => Tag::Jovian,
            "wildlife" => Tag::Wildlife,
            "wild" => Tag::Wild,
            _ => Tag::Unknown(s),
        }
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::from(s.to_string())
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
