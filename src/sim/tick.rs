//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Ordering within
//! a tick is fixed: enemies move before towers aim, towers fire
//! before projectiles fly, and cleanup runs after all combat.

use super::combat::{advance_projectiles, update_towers};
use super::effects::advance_effects;
use super::movement::move_enemies;
use super::state::{GamePhase, GameState};
use super::wave::{advance_schedule, update_waves};

/// Advance the game state by one tick
///
/// Does nothing unless the game is running.
pub fn tick(state: &mut GameState) {
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;

    let in_flight = state.projectiles.len();
    move_enemies(state);
    update_towers(state);
    advance_projectiles(state, in_flight);
    advance_effects(state);
    cleanup(state);

    // A castle breach this tick ends the game before any wave bookkeeping
    if state.phase.is_halted() {
        return;
    }

    advance_schedule(state);
    update_waves(state);
}

/// Drop dead or arrived enemies and resolved projectiles
///
/// Both filters are idempotent.
pub fn cleanup(state: &mut GameState) {
    state.enemies.retain(|e| !e.is_terminal());
    state.projectiles.retain(|p| !p.hit);
}
