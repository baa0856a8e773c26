//! Enemy movement along the road

use super::geometry::{Step, step_toward};
use super::state::{GamePhase, GameState};

/// Advance every enemy one step toward its next waypoint
///
/// An enemy that reaches the final waypoint is flagged `reached` and costs
/// one life. Running out of lives ends the game.
pub fn move_enemies(state: &mut GameState) {
    let GameState {
        enemies,
        map,
        lives,
        phase,
        ..
    } = state;
    let last = map.path.len().saturating_sub(1);

    for enemy in enemies.iter_mut() {
        let speed = enemy.effective_speed();
        enemy.frozen = enemy.frozen.saturating_sub(1);

        let Some(&target) = map.path.get(enemy.wp + 1) else {
            continue;
        };

        match step_toward(enemy.pos, target, speed) {
            Step::Arrived(pos) => {
                enemy.pos = pos;
                enemy.wp += 1;
                if enemy.wp >= last {
                    enemy.reached = true;
                    *lives = lives.saturating_sub(1);
                    log::debug!("{:?} {} reached the castle, {} lives left", enemy.kind, enemy.id, lives);
                    if *lives == 0 && !phase.is_halted() {
                        log::info!("Game over");
                        *phase = GamePhase::GameOver;
                    }
                }
            }
            Step::Moved(pos) => enemy.pos = pos,
        }
    }
}
