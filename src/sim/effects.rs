//! Cosmetic particles and floating damage numbers

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Particle, Tint};
use crate::consts::*;

/// Emit `count` sparks from `pos`
pub fn spawn_burst(state: &mut GameState, pos: Vec2, color: Tint, count: usize) {
    for _ in 0..count {
        let vel = Vec2::new(
            (state.rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
            (state.rng.random::<f32>() - 0.5) * PARTICLE_SPREAD,
        );
        state.particles.push(Particle {
            pos,
            vel,
            life: PARTICLE_LIFE,
            color,
        });
    }
}

/// Move particles and damage text, dropping the expired ones
pub fn advance_effects(state: &mut GameState) {
    for particle in state.particles.iter_mut() {
        particle.advance();
    }
    state.particles.retain(|p| p.life > 0);

    for text in state.floating_texts.iter_mut() {
        text.advance();
    }
    state.floating_texts.retain(|t| t.life > 0);
}
