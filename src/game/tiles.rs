//! Tile queues and tile placement

use crate::board::{Board, HexCoord};
use crate::core::{CardId, GameId, GlobalParameter, PendingTileSelection, Player, PlayerId, ResourceSet, TileKind};
use crate::events::{DomainEvent, PlacementBonusGained, TilePlaced};
use crate::game::parameters::{apply_parameter_steps, publish_parameter_changes, ParameterChange};
use crate::game::EngineContext;
use crate::undo::{StateChange, UndoLog};
use crate::{EngineError, Result};

/// Turn the next queued tile into a pending selection
///
/// Does nothing while a selection is already pending. Tiles with no legal
/// hex left are dropped from the queue.
pub(crate) fn advance_tile_queue(
    ctx: &EngineContext,
    game_id: &GameId,
    player_id: &PlayerId,
) -> Result<Option<PendingTileSelection>> {
    let game = ctx.games.get_by_id(game_id)?;
    queue_next_tile(ctx, game_id, player_id, &game.board)
}

/// Offer the next queued tile with legal hexes taken from `board`
fn queue_next_tile(
    ctx: &EngineContext,
    game_id: &GameId,
    player_id: &PlayerId,
    board: &Board,
) -> Result<Option<PendingTileSelection>> {
    let player = ctx.players.get_by_id(game_id, player_id)?;
    if player.pending_tile_selection.is_some() {
        return Ok(None);
    }
    let Some(mut queue) = player.tile_queue else {
        return Ok(None);
    };

    while let Some(tile) = queue.items.pop_front() {
        let available_hexes = board.legal_hexes(tile, player_id);
        if available_hexes.is_empty() {
            tracing::warn!(game_id = %game_id, player_id = %player_id, %tile, "no legal hex, tile dropped");
            continue;
        }

        let selection = PendingTileSelection {
            tile,
            available_hexes,
            source: queue.source.clone(),
        };
        let remaining = if queue.items.is_empty() { None } else { Some(queue) };
        ctx.players.update_tile_queue(game_id, player_id, remaining)?;
        ctx.players
            .update_pending_tile_selection(game_id, player_id, Some(selection.clone()))?;
        tracing::debug!(
            game_id = %game_id,
            player_id = %player_id,
            %tile,
            hexes = selection.available_hexes.len(),
            "tile selection pending"
        );
        return Ok(Some(selection));
    }

    ctx.players.update_tile_queue(game_id, player_id, None)?;
    Ok(None)
}

pub struct TileService {
    ctx: EngineContext,
}

impl TileService {
    pub fn new(ctx: EngineContext) -> Self {
        TileService { ctx }
    }

    pub fn advance_queue(&self, game_id: &GameId, player_id: &PlayerId) -> Result<Option<PendingTileSelection>> {
        advance_tile_queue(&self.ctx, game_id, player_id)
    }

    /// Place the pending tile on `coord`
    ///
    /// Oceans raise the ocean count and greeneries raise oxygen. Any printed
    /// bonus on the hex goes to the player. Returns the bonus granted.
    pub fn place_tile(&self, game_id: &GameId, player_id: &PlayerId, coord: HexCoord) -> Result<ResourceSet> {
        let ctx = &self.ctx;
        let player = ctx.players.get_by_id(game_id, player_id)?;
        let selection = player
            .pending_tile_selection
            .clone()
            .ok_or_else(|| EngineError::InvalidSelection("no tile placement is pending".to_string()))?;
        if !selection.available_hexes.contains(&coord) {
            return Err(EngineError::InvalidSelection(format!(
                "hex {coord} is not available for a {} tile",
                selection.tile
            )));
        }

        let game = ctx.games.get_by_id(game_id)?;
        let bonus = game.board.hex(&coord).map(|h| h.bonus).unwrap_or_default();

        let mut log = UndoLog::new(game_id.clone());
        let result = self.write_placement(game_id, &player, &selection, coord, &bonus, &mut log);
        let changes = match result {
            Ok(changes) => changes,
            Err(err) => {
                let mut no_subscriptions = |_: &CardId| Ok(());
                if let Err(rewind_err) =
                    log.rewind(ctx.games.as_ref(), ctx.players.as_ref(), &mut no_subscriptions)
                {
                    tracing::error!(game_id = %game_id, error = %rewind_err, "rewind incomplete");
                }
                return Err(err);
            }
        };

        tracing::info!(
            game_id = %game_id,
            player_id = %player_id,
            tile = %selection.tile,
            %coord,
            source = %selection.source,
            "tile placed"
        );

        publish_parameter_changes(ctx, game_id, &changes)?;
        if !bonus.is_zero() {
            ctx.bus.publish(DomainEvent::PlacementBonusGained(PlacementBonusGained {
                game_id: game_id.clone(),
                player_id: player_id.clone(),
                resources: bonus,
                coord,
            }))?;
        }
        ctx.bus.publish(DomainEvent::TilePlaced(TilePlaced {
            game_id: game_id.clone(),
            player_id: player_id.clone(),
            tile: selection.tile,
            coord,
            source: Some(selection.source.clone()),
        }))?;

        Ok(bonus)
    }

    fn write_placement(
        &self,
        game_id: &GameId,
        player: &Player,
        selection: &PendingTileSelection,
        coord: HexCoord,
        bonus: &ResourceSet,
        log: &mut UndoLog,
    ) -> Result<Vec<ParameterChange>> {
        let ctx = &self.ctx;
        let player_id = &player.id;

        log.log(StateChange::TileQueue {
            player_id: player_id.clone(),
            previous: player.tile_queue.clone(),
            previous_selection: player.pending_tile_selection.clone(),
        });
        ctx.players.update_pending_tile_selection(game_id, player_id, None)?;

        if !bonus.is_zero() {
            let mut resources = player.resources;
            resources.apply_delta(bonus);
            log.log(StateChange::Resources {
                player_id: player_id.clone(),
                previous: player.resources,
            });
            ctx.players.update_resources(game_id, player_id, resources)?;
        }

        let raised = match selection.tile {
            TileKind::Ocean => Some(GlobalParameter::Oceans),
            TileKind::Greenery => Some(GlobalParameter::Oxygen),
            TileKind::City => None,
        };
        let steps: Vec<(GlobalParameter, i32)> = raised.into_iter().map(|p| (p, 1)).collect();
        let changes = apply_parameter_steps(ctx, game_id, player_id, &steps, log)?;

        // The board write is not logged and must come last; the next tile is
        // offered against a copy that already holds this placement
        let owner = (selection.tile != TileKind::Ocean).then(|| player_id.clone());
        let mut board = ctx.games.get_by_id(game_id)?.board;
        board.occupy(coord, selection.tile, owner.clone())?;
        queue_next_tile(ctx, game_id, player_id, &board)?;

        ctx.games.place_tile(game_id, coord, selection.tile, owner)?;
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::core::{BaseResource, Game, TileQueue};
    use crate::events::EventKind;
    use crate::repository::{InMemoryCardDeck, InMemoryCardRepository, InMemoryGameRepository, InMemoryPlayerRepository};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn ids() -> (GameId, PlayerId) {
        (GameId::new("g1"), PlayerId::new("p1"))
    }

    fn context(board: Board, queue: Vec<TileKind>) -> EngineContext {
        let games = InMemoryGameRepository::new();
        games.insert(Game::new("g1", board)).unwrap();
        let mut player = crate::core::Player::new("p1", "Alice");
        player.tile_queue = Some(TileQueue {
            source: "SRC".to_string(),
            items: VecDeque::from(queue),
        });
        let players = InMemoryPlayerRepository::new();
        players.insert(&GameId::new("g1"), player).unwrap();
        EngineContext::new(
            Arc::new(games),
            Arc::new(players),
            Arc::new(InMemoryCardRepository::default()),
            Arc::new(InMemoryCardDeck::new()),
            Arc::new(RulesConfig::default()),
        )
    }

    #[test]
    fn test_queue_skips_tiles_without_legal_hex() {
        // No ocean hexes on this board
        let ctx = context(Board::hexagon(1), vec![TileKind::Ocean, TileKind::City]);
        let (g, p) = ids();

        let selection = advance_tile_queue(&ctx, &g, &p).unwrap().unwrap();
        assert_eq!(selection.tile, TileKind::City);
        assert_eq!(selection.available_hexes.len(), 7);

        let player = ctx.player(&g, &p).unwrap();
        assert!(player.tile_queue.is_none());
        assert!(player.pending_tile_selection.is_some());

        // Pending selection blocks further advancing
        assert!(advance_tile_queue(&ctx, &g, &p).unwrap().is_none());
    }

    #[test]
    fn test_place_ocean_raises_oceans_and_grants_bonus() {
        let ocean = HexCoord::new(1, 0);
        let board = Board::hexagon(1)
            .with_ocean_reserved([ocean])
            .with_bonus(ocean, BaseResource::Plants, 2);
        let ctx = context(board, vec![TileKind::Ocean, TileKind::City]);
        let (g, p) = ids();
        let service = TileService::new(ctx.clone());
        service.advance_queue(&g, &p).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::OceansChanged, EventKind::PlacementBonusGained, EventKind::TilePlaced] {
            let sink = events.clone();
            ctx.bus
                .subscribe(kind, move |event| {
                    sink.lock().unwrap().push(event.kind());
                    Ok(())
                })
                .unwrap();
        }

        let bonus = service.place_tile(&g, &p, ocean).unwrap();
        assert_eq!(bonus.plants, 2);

        let game = ctx.game(&g).unwrap();
        assert_eq!(game.global_parameters.oceans, 1);
        let player = ctx.player(&g, &p).unwrap();
        assert_eq!(player.resources.plants, 2);
        assert_eq!(player.terraform_rating, 21);
        // Next queued tile is now pending
        assert_eq!(player.pending_tile_selection.unwrap().tile, TileKind::City);

        assert_eq!(
            *events.lock().unwrap(),
            vec![EventKind::OceansChanged, EventKind::PlacementBonusGained, EventKind::TilePlaced]
        );
    }

    #[test]
    fn test_next_tile_offered_against_updated_board() {
        let ctx = context(Board::hexagon(1), vec![TileKind::City, TileKind::Greenery]);
        let (g, p) = ids();
        let service = TileService::new(ctx.clone());
        service.advance_queue(&g, &p).unwrap();

        let city = HexCoord::new(1, 0);
        service.place_tile(&g, &p, city).unwrap();

        let game = ctx.game(&g).unwrap();
        assert!(game.board.hex(&city).unwrap().owned_by(&p));
        let greenery = ctx.player(&g, &p).unwrap().pending_tile_selection.unwrap();
        assert_eq!(greenery.tile, TileKind::Greenery);
        assert!(!greenery.available_hexes.contains(&city));
        assert!(greenery.available_hexes.iter().all(|h| h.is_adjacent(&city)));
    }

    #[test]
    fn test_stale_selection_fails_before_any_write() {
        let ctx = context(Board::hexagon(1), vec![TileKind::City, TileKind::City]);
        let (g, p) = ids();
        let service = TileService::new(ctx.clone());
        service.advance_queue(&g, &p).unwrap();
        let before = ctx.player(&g, &p).unwrap();

        // Someone else took the hex after the selection was offered
        let taken = HexCoord::new(0, 0);
        ctx.games.place_tile(&g, taken, TileKind::City, None).unwrap();

        let err = service.place_tile(&g, &p, taken).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelection(_)));
        assert_eq!(ctx.player(&g, &p).unwrap(), before);
    }

    #[test]
    fn test_place_on_unlisted_hex_is_rejected() {
        let ctx = context(Board::hexagon(1), vec![TileKind::City]);
        let (g, p) = ids();
        let service = TileService::new(ctx.clone());

        let err = service.place_tile(&g, &p, HexCoord::new(0, 0)).unwrap_err();
        assert!(err.to_string().contains("no tile placement is pending"));

        service.advance_queue(&g, &p).unwrap();
        let err = service.place_tile(&g, &p, HexCoord::new(5, 5)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelection(_)));
        assert!(ctx.player(&g, &p).unwrap().pending_tile_selection.is_some());
    }
}
