//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (collection order, ids never reused)
//! - No rendering or platform dependencies

pub mod combat;
pub mod economy;
pub mod effects;
pub mod geometry;
pub mod map;
pub mod movement;
pub mod state;
pub mod tick;
pub mod wave;

pub use map::{Decoration, DecorationKind, GameMap, Hsl, MapColors, generate_map};
pub use state::{
    Enemy, EnemyId, EnemyKind, FloatingText, GamePhase, GameState, Particle, Projectile, Tint,
    Tower, TowerId, TowerKind, WeaponBehavior,
};
pub use tick::tick;
pub use wave::{ScheduledAction, ScheduledEvent};
