//! Clamped global parameter updates

use crate::config::RulesConfig;
use crate::core::{GameId, GlobalParameter, PlayerId};
use crate::events::{DomainEvent, ParameterChanged};
use crate::game::EngineContext;
use crate::undo::{StateChange, UndoLog};
use crate::Result;

/// Old and new value of one global parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterChange {
    pub parameter: GlobalParameter,
    pub old_value: i32,
    pub new_value: i32,
}

impl ParameterChange {
    /// Move `current` by `steps`, clamped to the parameter's range.
    /// Overshoot is discarded silently.
    pub fn compute(rules: &RulesConfig, parameter: GlobalParameter, current: i32, steps: i32) -> Self {
        let range = rules.range(parameter);
        ParameterChange {
            parameter,
            old_value: current,
            new_value: range.clamp(current.saturating_add(steps.saturating_mul(range.step))),
        }
    }

    pub fn changed(&self) -> bool {
        self.old_value != self.new_value
    }

    /// Whole steps actually gained (0 for decreases)
    pub fn steps_gained(&self, rules: &RulesConfig) -> i32 {
        let step = rules.range(self.parameter).step.max(1);
        ((self.new_value - self.old_value) / step).max(0)
    }

    pub fn to_event(&self, game_id: &GameId) -> DomainEvent {
        DomainEvent::parameter_changed(
            self.parameter,
            ParameterChanged {
                game_id: game_id.clone(),
                old_value: self.old_value,
                new_value: self.new_value,
            },
        )
    }
}

/// Write clamped parameter values and any terraform rating they award
///
/// Every write is logged to `log`. Events are not published here; callers
/// publish with [`publish_parameter_changes`] once all of their writes
/// have succeeded.
pub(crate) fn apply_parameter_steps(
    ctx: &EngineContext,
    game_id: &GameId,
    player_id: &PlayerId,
    steps: &[(GlobalParameter, i32)],
    log: &mut UndoLog,
) -> Result<Vec<ParameterChange>> {
    if steps.iter().all(|(_, s)| *s == 0) {
        return Ok(Vec::new());
    }

    let game = ctx.games.get_by_id(game_id)?;
    let mut changes = Vec::new();

    for &(parameter, amount) in steps {
        if amount == 0 {
            continue;
        }
        let current = game.global_parameters.get(parameter);
        let change = ParameterChange::compute(&ctx.rules, parameter, current, amount);
        if !change.changed() {
            tracing::debug!(game_id = %game_id, %parameter, value = current, "parameter already at bound");
            continue;
        }

        log.log(StateChange::GlobalParameter {
            parameter,
            previous: current,
        });
        ctx.games.update_global_parameter(game_id, parameter, change.new_value)?;
        tracing::info!(
            game_id = %game_id,
            %parameter,
            old = change.old_value,
            new = change.new_value,
            "global parameter changed"
        );
        changes.push(change);
    }

    if ctx.rules.terraform_rating_per_step {
        let gained: i32 = changes.iter().map(|c| c.steps_gained(&ctx.rules)).sum();
        if gained > 0 {
            let player = ctx.players.get_by_id(game_id, player_id)?;
            log.log(StateChange::TerraformRating {
                player_id: player_id.clone(),
                previous: player.terraform_rating,
            });
            ctx.players
                .update_terraform_rating(game_id, player_id, player.terraform_rating + gained)?;
        }
    }

    Ok(changes)
}

pub(crate) fn publish_parameter_changes(
    ctx: &EngineContext,
    game_id: &GameId,
    changes: &[ParameterChange],
) -> Result<()> {
    for change in changes {
        ctx.bus.publish(change.to_event(game_id))?;
    }
    Ok(())
}
