//! Realm Defense - A procedurally generated tower defense game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (map, waves, combat, economy, tick)
//! - `controller`: Frame loop, speed/pause handling and player commands
//! - `assets`: Sprite manifest and start-up verification
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod controller;
pub mod error;
pub mod sim;
pub mod tuning;

pub use controller::{
    ClickOutcome, FrameOutcome, GameSpeed, Hud, Renderer, SimulationController, Snapshot,
};
pub use error::CommandError;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal simulation rate (ticks per second at 1x speed)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Height of the HUD strip at the top of the canvas that the path must avoid
    pub const UI_EXCLUSION_HEIGHT: f32 = 80.0;
    /// Grid used to lay out path checkpoints
    pub const MAP_COLUMNS: u32 = 8;
    pub const MAP_ROWS: u32 = 6;
    /// Number of decorative props scattered around the map
    pub const DECORATION_COUNT: usize = 50;
    /// Props keep this distance from the road
    pub const DECORATION_CLEARANCE: f32 = 60.0;

    /// Ticks between two spawns while a queue drains (spawn fires once the timer exceeds it)
    pub const SPAWN_INTERVAL_TICKS: u32 = 40;
    /// Delay before the first wave of a level
    pub const LEVEL_START_DELAY_TICKS: u32 = TICKS_PER_SECOND;
    /// Delay between a cleared wave and the next one
    pub const WAVE_BREAK_TICKS: u32 = 2 * TICKS_PER_SECOND;

    /// Turret recoil animation length
    pub const SHOOTING_ANIMATION_TICKS: u32 = 5;
    /// Frozen duration applied by slow weapons
    pub const FROZEN_TICKS: u32 = 40;
    /// Speed factor while frozen
    pub const FROZEN_SPEED_FACTOR: f32 = 0.5;
    /// Splash radius of area weapons
    pub const SPLASH_RADIUS: f32 = 60.0;
    /// Splash damage as a fraction of the direct hit
    pub const SPLASH_FACTOR: f32 = 0.5;
    /// Chain weapons also connect inside this radius
    pub const CHAIN_HIT_RADIUS: f32 = 20.0;
    /// Search radius for the next chain target
    pub const CHAIN_SEARCH_RADIUS: f32 = 150.0;
    /// Maximum number of bounces for chain weapons
    pub const MAX_CHAIN_DEPTH: u8 = 3;
    /// Damage carried over to each chain bounce
    pub const CHAIN_DAMAGE_FACTOR: f32 = 0.7;

    /// Particle lifetime and spread
    pub const PARTICLE_LIFE: u32 = 15;
    pub const PARTICLE_SPREAD: f32 = 5.0;
    /// Floating damage text lifetime and upward drift per tick
    pub const FLOATING_TEXT_LIFE: u32 = 40;
    pub const FLOATING_TEXT_DRIFT: f32 = 0.8;

    /// Placement exclusion radii
    pub const CASTLE_CLEARANCE: f32 = 50.0;
    pub const TOWER_CLEARANCE: f32 = 30.0;
    pub const ROAD_CLEARANCE: f32 = 30.0;
    /// Clicking within this distance of a tower selects it
    pub const TOWER_SELECT_RADIUS: f32 = 20.0;
}

/// Angle (radians) of the direction from `from` toward `to`
#[inline]
pub fn angle_toward(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
