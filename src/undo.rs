//! Undo log for multi-step effect commits
//!
//! Effect application writes several player/game records one at a time.
//! Before each write the previous value is pushed onto an [`UndoLog`]; if a
//! later write fails the log is rewound in reverse order, restoring every
//! record touched so far.

use crate::core::{
    CardId, GameId, GlobalParameter, PendingCardDrawSelection, PendingTileSelection, PlayerAction,
    PlayerEffect, PlayerId, ResourceSet, TileQueue,
};
use crate::repository::{GameRepository, PlayerRepository};
use crate::Result;
use rustc_hash::FxHashMap;

/// A single record write, holding the value it replaced
#[derive(Debug, Clone)]
pub enum StateChange {
    Production { player_id: PlayerId, previous: ResourceSet },

    Resources { player_id: PlayerId, previous: ResourceSet },

    Actions { player_id: PlayerId, previous: Vec<PlayerAction> },

    Effects { player_id: PlayerId, previous: Vec<PlayerEffect> },

    /// Event-bus subscriptions created for a card
    Subscribed { card_id: CardId },

    VictoryPoints { player_id: PlayerId, previous: i32 },

    TerraformRating { player_id: PlayerId, previous: i32 },

    ResourceStorage {
        player_id: PlayerId,
        previous: FxHashMap<CardId, i32>,
    },

    TileQueue {
        player_id: PlayerId,
        previous: Option<TileQueue>,
        previous_selection: Option<PendingTileSelection>,
    },

    CardDrawSelection {
        player_id: PlayerId,
        previous: Option<PendingCardDrawSelection>,
    },

    Hand { player_id: PlayerId, previous: Vec<CardId> },

    PlayedCards { player_id: PlayerId, previous: Vec<CardId> },

    GlobalParameter { parameter: GlobalParameter, previous: i32 },
}

/// Stack of record writes (most recent at end)
#[derive(Debug, Clone)]
pub struct UndoLog {
    game_id: GameId,
    changes: Vec<StateChange>,
}

impl UndoLog {
    pub fn new(game_id: GameId) -> Self {
        UndoLog {
            game_id,
            changes: Vec::new(),
        }
    }

    pub fn log(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[StateChange] {
        &self.changes
    }

    /// Restore every logged record, newest first
    ///
    /// `unsubscribe` is called for each card whose subscriptions must be
    /// dropped. Restoration keeps going past individual failures; the first
    /// failure is returned once everything has been attempted.
    pub fn rewind(
        &mut self,
        games: &dyn GameRepository,
        players: &dyn PlayerRepository,
        unsubscribe: &mut dyn FnMut(&CardId) -> Result<()>,
    ) -> Result<()> {
        let game_id = self.game_id.clone();
        let mut first_error = None;

        while let Some(change) = self.changes.pop() {
            let result = match change {
                StateChange::Production { player_id, previous } => {
                    players.update_production(&game_id, &player_id, previous)
                }
                StateChange::Resources { player_id, previous } => {
                    players.update_resources(&game_id, &player_id, previous)
                }
                StateChange::Actions { player_id, previous } => {
                    players.update_player_actions(&game_id, &player_id, previous)
                }
                StateChange::Effects { player_id, previous } => {
                    players.update_player_effects(&game_id, &player_id, previous)
                }
                StateChange::Subscribed { card_id } => unsubscribe(&card_id),
                StateChange::VictoryPoints { player_id, previous } => {
                    players.update_victory_points(&game_id, &player_id, previous)
                }
                StateChange::TerraformRating { player_id, previous } => {
                    players.update_terraform_rating(&game_id, &player_id, previous)
                }
                StateChange::ResourceStorage { player_id, previous } => {
                    players.update_resource_storage(&game_id, &player_id, previous)
                }
                StateChange::TileQueue {
                    player_id,
                    previous,
                    previous_selection,
                } => players
                    .update_tile_queue(&game_id, &player_id, previous)
                    .and_then(|_| players.update_pending_tile_selection(&game_id, &player_id, previous_selection)),
                StateChange::CardDrawSelection { player_id, previous } => {
                    players.update_pending_card_draw_selection(&game_id, &player_id, previous)
                }
                StateChange::Hand { player_id, previous } => players.update_hand(&game_id, &player_id, previous),
                StateChange::PlayedCards { player_id, previous } => {
                    players.update_played_cards(&game_id, &player_id, previous)
                }
                StateChange::GlobalParameter { parameter, previous } => {
                    games.update_global_parameter(&game_id, parameter, previous)
                }
            };

            if let Err(err) = result {
                tracing::error!(game_id = %game_id, error = %err, "failed to restore record during rewind");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
