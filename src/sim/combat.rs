//! Tower targeting, projectile flight and hit resolution
//!
//! A tower aims at the first enemy in collection order that is within range,
//! not the nearest one.

use glam::Vec2;

use super::effects::spawn_burst;
use super::state::{Enemy, FloatingText, GameState, Projectile, Tint, WeaponBehavior};
use crate::angle_toward;
use crate::consts::*;

/// First enemy (in collection order) within `range` of `pos`
pub fn acquire_target(enemies: &[Enemy], pos: Vec2, range: f32) -> Option<&Enemy> {
    enemies.iter().find(|e| e.pos.distance(pos) <= range)
}

/// Cool down every tower and fire the ready ones
pub fn update_towers(state: &mut GameState) {
    let GameState {
        towers,
        enemies,
        projectiles,
        tuning,
        ..
    } = state;

    for tower in towers.iter_mut() {
        if tower.cooldown > 0 {
            tower.cooldown -= 1;
        } else {
            let stats = tuning.towers.get(tower.kind);
            // range_mult is tracked on upgrade but targeting uses the base range
            if let Some(target) = acquire_target(enemies, tower.pos, stats.range) {
                tower.angle = angle_toward(tower.pos, target.pos);
                projectiles.push(Projectile::fire(tower, stats, target.id));
                tower.cooldown = stats.rate;
                tower.shooting = SHOOTING_ANIMATION_TICKS;
            }
        }
        tower.shooting = tower.shooting.saturating_sub(1);
    }
}

/// Move every projectile currently in flight and resolve the ones that connect
pub fn update_projectiles(state: &mut GameState) {
    let in_flight = state.projectiles.len();
    advance_projectiles(state, in_flight);
}

/// Step only the first `in_flight` projectiles
///
/// Anything pushed past that index (shots fired this tick, chain bounces)
/// waits for the next tick.
pub fn advance_projectiles(state: &mut GameState, in_flight: usize) {
    for index in 0..in_flight.min(state.projectiles.len()) {
        if !state.projectiles[index].hit {
            step_projectile(state, index);
        }
    }
}

fn step_projectile(state: &mut GameState, index: usize) {
    let target_id = state.projectiles[index].target;
    let target_index = state
        .enemies
        .iter()
        .position(|e| e.id == target_id)
        .filter(|&i| {
            let target = &state.enemies[i];
            target.is_alive() || target.reached
        });

    // Target removed or already killed: drop the projectile without damage
    let Some(target_index) = target_index else {
        state.projectiles[index].hit = true;
        return;
    };

    let target_pos = state.enemies[target_index].pos;
    let projectile = &mut state.projectiles[index];
    let dist = projectile.pos.distance(target_pos);

    if projectile.connects_at(dist) {
        projectile.hit = true;
        let projectile = projectile.clone();
        resolve_hit(state, &projectile, target_index);
    } else {
        let dir = (target_pos - projectile.pos) / dist;
        projectile.pos += dir * projectile.speed;
        projectile.angle = dir.y.atan2(dir.x);
    }
}

/// Apply a projectile's effect to its target (and neighbours)
fn resolve_hit(state: &mut GameState, projectile: &Projectile, target_index: usize) {
    let impact = projectile.pos;
    let damage = projectile.damage;

    let target = &mut state.enemies[target_index];
    let target_id = target.id;
    let target_pos = target.pos;
    let target_was_alive = target.is_alive();
    target.apply_damage(damage);

    match projectile.behavior {
        WeaponBehavior::Single => spawn_burst(state, impact, Tint::White, 5),
        WeaponBehavior::Slow => {
            state.enemies[target_index].frozen = FROZEN_TICKS;
            spawn_burst(state, impact, Tint::White, 5);
        }
        WeaponBehavior::Area => {
            // The primary target sits inside its own splash and takes both hits
            let splash = damage * SPLASH_FACTOR;
            for enemy in state.enemies.iter_mut() {
                if enemy.is_alive() && enemy.pos.distance(target_pos) < SPLASH_RADIUS {
                    enemy.apply_damage(splash);
                }
            }
            spawn_burst(state, impact, Tint::Orange, 10);
        }
        WeaponBehavior::Chain => {
            spawn_burst(state, impact, Tint::Cyan, 5);
            if projectile.chain_depth < MAX_CHAIN_DEPTH {
                let next = state.enemies.iter().find(|e| {
                    e.id != target_id
                        && e.is_alive()
                        && e.pos.distance(impact) < CHAIN_SEARCH_RADIUS
                });
                if let Some(next) = next {
                    let bounce = Projectile {
                        pos: impact,
                        target: next.id,
                        damage: damage * CHAIN_DAMAGE_FACTOR,
                        hit: false,
                        angle: angle_toward(impact, next.pos),
                        chain_depth: projectile.chain_depth + 1,
                        ..projectile.clone()
                    };
                    state.projectiles.push(bounce);
                }
            }
        }
    }

    state.floating_texts.push(FloatingText::damage(impact, damage));

    // Only the projectile's own target pays out; splash-only kills earn nothing
    let target = &state.enemies[target_index];
    if target_was_alive && !target.is_alive() {
        let reward = target.reward;
        state.gold += reward as f32;
        log::debug!("{:?} kill, +{} gold", projectile.tower_kind, reward);
    }
}
