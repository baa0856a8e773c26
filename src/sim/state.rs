//! Game state and core simulation types
//!
//! Everything the tick mutates lives in [`GameState`]. Entities refer to each
//! other by id only, so removing an enemy never leaves a dangling reference.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::map::GameMap;
use super::wave::ScheduledEvent;
use crate::consts::*;
use crate::tuning::{TowerStats, Tuning};

pub type EnemyId = u32;
pub type TowerId = u32;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Simulation advances every frame
    Running,
    /// Frames still render, ticks do not run
    Paused,
    /// Every wave of the level was cleared; waiting for the next-level command
    LevelComplete,
    /// Lives ran out; waiting for a restart
    GameOver,
}

impl GamePhase {
    /// Halted phases stop the frame loop entirely
    pub fn is_halted(self) -> bool {
        matches!(self, GamePhase::LevelComplete | GamePhase::GameOver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Orc,
    Bat,
    Golem,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Orc, EnemyKind::Bat, EnemyKind::Golem];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    Archer,
    Cannon,
    Ice,
    Tesla,
}

impl TowerKind {
    pub const ALL: [TowerKind; 4] = [
        TowerKind::Archer,
        TowerKind::Cannon,
        TowerKind::Ice,
        TowerKind::Tesla,
    ];

    /// Lowercase name used by host bindings and sprite keys
    pub fn name(self) -> &'static str {
        match self {
            TowerKind::Archer => "archer",
            TowerKind::Cannon => "cannon",
            TowerKind::Ice => "ice",
            TowerKind::Tesla => "tesla",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// What a projectile does when it connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponBehavior {
    Single,
    Slow,
    Area,
    Chain,
}

/// Colors used by cosmetic effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tint {
    White,
    Orange,
    Cyan,
    Yellow,
}

impl Tint {
    pub fn css(self) -> &'static str {
        match self {
            Tint::White => "white",
            Tint::Orange => "orange",
            Tint::Cyan => "cyan",
            Tint::Yellow => "#ffeb3b",
        }
    }
}

/// An enemy walking the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Index of the last waypoint reached
    pub wp: usize,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub reward: u32,
    /// Ticks of slowed movement remaining
    pub frozen: u32,
    /// Reached the castle; removed at the next cleanup
    pub reached: bool,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Dead or arrived enemies are dropped by cleanup
    pub fn is_terminal(&self) -> bool {
        !self.is_alive() || self.reached
    }

    /// Speed for the current tick (halved while frozen)
    pub fn effective_speed(&self) -> f32 {
        if self.frozen > 0 {
            self.speed * FROZEN_SPEED_FACTOR
        } else {
            self.speed
        }
    }

    /// Subtract damage, clamping at zero
    pub fn apply_damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount).max(0.0);
    }
}

/// A built tower
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tower {
    pub id: TowerId,
    pub kind: TowerKind,
    pub pos: Vec2,
    /// Ticks until the tower may fire again
    pub cooldown: u32,
    /// Turret aim angle (radians)
    pub angle: f32,
    /// Recoil animation ticks remaining
    pub shooting: u32,
    pub level: u32,
    /// Gold spent on the tower so far (build + upgrades)
    pub total_cost: u32,
    pub damage_mult: f32,
    /// Grows with upgrades but does not affect targeting yet
    pub range_mult: f32,
}

impl Tower {
    pub fn new(id: TowerId, kind: TowerKind, pos: Vec2, cost: u32) -> Self {
        Self {
            id,
            kind,
            pos,
            cooldown: 0,
            angle: 0.0,
            shooting: 0,
            level: 1,
            total_cost: cost,
            damage_mult: 1.0,
            range_mult: 1.0,
        }
    }
}

/// A homing projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub tower_kind: TowerKind,
    pub behavior: WeaponBehavior,
    pub speed: f32,
    pub target: EnemyId,
    /// Damage resolved when the projectile was fired
    pub damage: f32,
    pub hit: bool,
    pub angle: f32,
    /// Number of bounces so far (chain weapons only)
    pub chain_depth: u8,
}

impl Projectile {
    /// Fire a fresh projectile from a tower
    pub fn fire(tower: &Tower, stats: &TowerStats, target: EnemyId) -> Self {
        Self {
            pos: tower.pos,
            tower_kind: tower.kind,
            behavior: stats.behavior,
            speed: stats.projectile_speed,
            target,
            damage: stats.damage * tower.damage_mult,
            hit: false,
            angle: tower.angle,
            chain_depth: 0,
        }
    }

    /// Distance at which the projectile connects with its target
    pub fn connects_at(&self, dist: f32) -> bool {
        dist < self.speed || (self.behavior == WeaponBehavior::Chain && dist < CHAIN_HIT_RADIUS)
    }
}

/// A cosmetic spark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub color: Tint,
}

impl Particle {
    pub fn advance(&mut self) {
        self.pos += self.vel;
        self.life = self.life.saturating_sub(1);
    }
}

/// Damage number rising from an impact point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub color: Tint,
    pub life: u32,
    /// Upward drift per tick
    pub drift: f32,
}

impl FloatingText {
    pub fn damage(pos: Vec2, amount: f32) -> Self {
        Self {
            pos,
            text: format!("{}", amount.floor() as i64),
            color: Tint::Yellow,
            life: FLOATING_TEXT_LIFE,
            drift: FLOATING_TEXT_DRIFT,
        }
    }

    pub fn advance(&mut self) {
        self.pos.y -= self.drift;
        self.life = self.life.saturating_sub(1);
    }
}

/// Complete game state (deterministic for a given seed and command sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    /// Current level (1-based)
    pub level: u32,
    pub gold: f32,
    pub lives: u32,
    /// Current wave within the level (1-based)
    pub wave: u32,
    pub max_towers: usize,
    /// Price of the next tower slot
    pub tower_slot_cost: u32,
    pub phase: GamePhase,
    pub wave_active: bool,
    pub spawn_queue: VecDeque<EnemyKind>,
    pub spawn_timer: u32,
    /// Delayed actions counted in ticks
    pub scheduled: Vec<ScheduledEvent>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub map: GameMap,
    pub enemies: Vec<Enemy>,
    pub towers: Vec<Tower>,
    pub projectiles: Vec<Projectile>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,
    next_id: u32,
}

impl GameState {
    /// Create a new game at level 1 with the given seed
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: 1,
            gold: tuning.economy.starting_gold,
            lives: tuning.economy.lives,
            wave: 1,
            max_towers: tuning.economy.initial_max_towers,
            tower_slot_cost: tuning.economy.initial_slot_cost,
            phase: GamePhase::Running,
            wave_active: false,
            spawn_queue: VecDeque::new(),
            spawn_timer: 0,
            scheduled: Vec::new(),
            time_ticks: 0,
            map: GameMap::default(),
            enemies: Vec::new(),
            towers: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            floating_texts: Vec::new(),
            next_id: 1,
            tuning,
        };

        state.start_level();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn tower_stats(&self, kind: TowerKind) -> &TowerStats {
        self.tuning.towers.get(kind)
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    /// Gold as shown to the player
    pub fn gold_display(&self) -> u32 {
        self.gold.max(0.0).floor() as u32
    }

    /// Number of enemies that are still a threat this wave
    pub fn enemies_remaining(&self) -> usize {
        self.enemies.len() + self.spawn_queue.len()
    }
}
