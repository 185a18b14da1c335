//! Collaborator contracts for persistence and the card catalog.

mod memory;
mod traits;

pub use memory::{InMemoryCardDeck, InMemoryCardRepository, InMemoryGameRepository, InMemoryPlayerRepository};
pub use traits::{CardDeckRepository, CardRepository, GameRepository, PlayerRepository};
