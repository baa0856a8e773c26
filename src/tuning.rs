//! Data-driven game balance
//!
//! Everything a designer might want to tweak lives in [`Tuning`]. The default
//! value reproduces the stock game; a JSON document may override any subset
//! of the sections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{EnemyKind, TowerKind, WeaponBehavior};

/// Errors raised while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Immutable stats shared by every tower of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    pub cost: u32,
    pub range: f32,
    pub damage: f32,
    /// Fire-rate period in ticks
    pub rate: u32,
    pub projectile_speed: f32,
    pub behavior: WeaponBehavior,
    /// First wave at which the tower can be selected
    pub unlock_wave: u32,
    pub icon: String,
    pub turret_sprite: String,
    pub projectile_sprite: String,
}

impl TowerStats {
    #[allow(clippy::too_many_arguments)]
    fn new(
        cost: u32,
        range: f32,
        damage: f32,
        rate: u32,
        projectile_speed: f32,
        behavior: WeaponBehavior,
        unlock_wave: u32,
        icon: &str,
        sprite: &str,
    ) -> Self {
        Self {
            cost,
            range,
            damage,
            rate,
            projectile_speed,
            behavior,
            unlock_wave,
            icon: icon.to_string(),
            turret_sprite: format!("{sprite}_turret"),
            projectile_sprite: format!("{sprite}_projectile"),
        }
    }
}

/// Stats for every tower kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    pub archer: TowerStats,
    pub cannon: TowerStats,
    pub ice: TowerStats,
    pub tesla: TowerStats,
}

impl Default for TowerTable {
    fn default() -> Self {
        use WeaponBehavior::*;
        Self {
            archer: TowerStats::new(50, 120.0, 15.0, 30, 12.0, Single, 1, "🏹", "archer"),
            cannon: TowerStats::new(120, 150.0, 50.0, 80, 10.0, Area, 1, "💣", "cannon"),
            ice: TowerStats::new(200, 100.0, 5.0, 10, 8.0, Slow, 1, "❄️", "ice"),
            tesla: TowerStats::new(300, 130.0, 20.0, 45, 14.0, Chain, 5, "⚡", "tesla"),
        }
    }
}

impl TowerTable {
    pub fn get(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::Archer => &self.archer,
            TowerKind::Cannon => &self.cannon,
            TowerKind::Ice => &self.ice,
            TowerKind::Tesla => &self.tesla,
        }
    }
}

/// Base stats for one enemy type (hp is scaled at spawn time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub hp: f32,
    pub speed: f32,
    pub reward: u32,
    pub icon: String,
}

impl EnemyStats {
    fn new(hp: f32, speed: f32, reward: u32, icon: &str) -> Self {
        Self {
            hp,
            speed,
            reward,
            icon: icon.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub orc: EnemyStats,
    pub bat: EnemyStats,
    pub golem: EnemyStats,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            orc: EnemyStats::new(30.0, 1.5, 10, "👾"),
            bat: EnemyStats::new(15.0, 3.5, 15, "🦇"),
            golem: EnemyStats::new(150.0, 0.8, 50, "👹"),
        }
    }
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Orc => &self.orc,
            EnemyKind::Bat => &self.bat,
            EnemyKind::Golem => &self.golem,
        }
    }
}

/// Wave composition and enemy scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub max_waves: u32,
    pub base_orcs: u32,
    pub orcs_per_wave: f32,
    pub bats_per_wave: f32,
    pub golems_per_wave: f32,
    /// hp multiplier = 1 + level * hp_per_level + wave * hp_per_wave
    pub hp_per_level: f32,
    pub hp_per_wave: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            max_waves: 20,
            base_orcs: 5,
            orcs_per_wave: 0.5,
            bats_per_wave: 0.4,
            golems_per_wave: 0.2,
            hp_per_level: 0.2,
            hp_per_wave: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub starting_gold: f32,
    /// Granted at the start of every level, the first one included
    pub level_bonus_gold: f32,
    pub lives: u32,
    pub initial_max_towers: usize,
    pub initial_slot_cost: u32,
    pub slot_cost_growth: f32,
    /// upgrade cost = floor(base cost * factor * level)
    pub upgrade_cost_factor: f32,
    pub upgrade_damage_step: f32,
    pub upgrade_range_step: f32,
    pub sell_refund: f32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            starting_gold: 150.0,
            level_bonus_gold: 50.0,
            lives: 10,
            initial_max_towers: 5,
            initial_slot_cost: 500,
            slot_cost_growth: 1.5,
            upgrade_cost_factor: 1.5,
            upgrade_damage_step: 0.5,
            upgrade_range_step: 0.2,
            sell_refund: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTuning {
    pub width: f32,
    pub height: f32,
    pub hue_palette: Vec<u16>,
    /// Probability that a decoration is a tree rather than a rock
    pub tree_weight: f64,
}

impl Default for MapTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            hue_palette: vec![120, 30, 200, 40],
            tree_weight: 0.7,
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub map: MapTuning,
    pub towers: TowerTable,
    pub enemies: EnemyTable,
    pub waves: WaveTuning,
    pub economy: EconomyTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.map.width <= 0.0 || self.map.height <= 0.0 {
            return Err(TuningError::Invalid(format!(
                "canvas must be positive, got {}x{}",
                self.map.width, self.map.height
            )));
        }
        if self.map.hue_palette.is_empty() {
            return Err(TuningError::Invalid("hue palette is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.map.tree_weight) {
            return Err(TuningError::Invalid(format!(
                "tree weight {} outside 0..=1",
                self.map.tree_weight
            )));
        }
        if self.waves.max_waves == 0 {
            return Err(TuningError::Invalid("a level needs at least one wave".into()));
        }
        for kind in TowerKind::ALL {
            let stats = self.towers.get(kind);
            if stats.projectile_speed <= 0.0 {
                return Err(TuningError::Invalid(format!(
                    "{kind:?} projectile speed must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_game() {
        let tuning = Tuning::default();
        assert_eq!(tuning.towers.archer.cost, 50);
        assert_eq!(tuning.towers.cannon.behavior, WeaponBehavior::Area);
        assert_eq!(tuning.towers.ice.rate, 10);
        assert_eq!(tuning.towers.tesla.behavior, WeaponBehavior::Chain);
        assert_eq!(tuning.enemies.golem.reward, 50);
        assert_eq!(tuning.waves.max_waves, 20);
        assert_eq!(tuning.economy.lives, 10);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "waves": { "max_waves": 3 }, "economy": { "starting_gold": 1000.0 } }"#;
        let tuning = Tuning::from_json(json).expect("valid tuning");
        assert_eq!(tuning.waves.max_waves, 3);
        // Unspecified fields keep their defaults
        assert_eq!(tuning.waves.base_orcs, 5);
        assert_eq!(tuning.economy.starting_gold, 1000.0);
        assert_eq!(tuning.economy.lives, 10);
        assert_eq!(tuning.towers, TowerTable::default());
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "waves": { "max_waves": 0 } }"#),
            Err(TuningError::Invalid(_))
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "map": { "hue_palette": [] } }"#),
            Err(TuningError::Invalid(_))
        ));
    }
}
