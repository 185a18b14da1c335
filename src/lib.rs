//! Terraform Engine - card behavior and passive-effect rules engine
//!
//! Interprets declarative card behaviors for a Terraforming-Mars style game:
//! requirement checks, payment, immediate effects, manual actions and
//! event-driven passive effects, on top of pluggable game/player repositories.

pub mod board;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod game;
pub mod repository;
pub mod session;
pub mod undo;

pub use config::RulesConfig;
pub use error::{EngineError, ErrorCategory, Result};
pub use session::{GameSession, SessionRegistry};
