//! Error types for the rules engine

use crate::core::{CardId, GameId, PlayerId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    RequirementNotMet(String),

    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Player {player} not found in game {game}")]
    PlayerNotFound { game: GameId, player: PlayerId },

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Target card {0} not found in played cards")]
    StorageTargetNotFound(CardId),

    #[error("Unknown payment substitute: {0}")]
    UnknownSubstitute(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Repository lock was poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse error classes used by callers to decide user-facing handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Requirement, affordability or payment problems
    Validation,
    /// Missing game, player or card records
    NotFound,
    /// Inconsistent runtime references
    Consistency,
    /// Storage or serialization failures
    Infrastructure,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::RequirementNotMet(_)
            | EngineError::InsufficientResources(_)
            | EngineError::InvalidPayment(_)
            | EngineError::InvalidAction(_) => ErrorCategory::Validation,
            EngineError::GameNotFound(_)
            | EngineError::PlayerNotFound { .. }
            | EngineError::CardNotFound(_) => ErrorCategory::NotFound,
            EngineError::StorageTargetNotFound(_)
            | EngineError::UnknownSubstitute(_)
            | EngineError::Unsupported(_)
            | EngineError::InvalidSelection(_) => ErrorCategory::Consistency,
            EngineError::LockPoisoned
            | EngineError::SerializationError(_)
            | EngineError::IoError(_) => ErrorCategory::Infrastructure,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(EngineError::InvalidPayment("x".into()).is_validation());
        assert_eq!(
            EngineError::CardNotFound(CardId::new("B01")).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            EngineError::StorageTargetNotFound(CardId::new("B01")).category(),
            ErrorCategory::Consistency
        );
        assert_eq!(EngineError::LockPoisoned.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn test_storage_target_message() {
        let err = EngineError::StorageTargetNotFound(CardId::new("C42"));
        assert_eq!(err.to_string(), "Target card C42 not found in played cards");
    }
}
