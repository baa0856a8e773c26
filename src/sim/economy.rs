//! Gold, tower building and level progression
//!
//! All player-initiated mutations of the economy go through here. Each command
//! validates first and only then mutates, so a rejected command leaves the
//! state exactly as it was.

use glam::Vec2;

use super::geometry::dist_to_polyline_sq;
use super::map::generate_map;
use super::state::{GamePhase, GameState, Tower, TowerId, TowerKind};
use super::wave::ScheduledAction;
use crate::consts::*;
use crate::error::CommandError;

impl GameState {
    /// Lay out a fresh map and reset per-level state
    ///
    /// Gold carries over (plus the level bonus), as do the tower limit and
    /// slot price. Towers do not survive a level change.
    pub fn start_level(&mut self) {
        self.map = generate_map(&mut self.rng, &self.tuning.map);
        self.gold += self.tuning.economy.level_bonus_gold;
        self.wave = 1;
        self.lives = self.tuning.economy.lives;

        self.enemies.clear();
        self.towers.clear();
        self.projectiles.clear();
        self.particles.clear();
        self.floating_texts.clear();
        self.spawn_queue.clear();
        self.scheduled.clear();
        self.spawn_timer = 0;
        self.wave_active = false;
        self.phase = GamePhase::Running;

        self.schedule(LEVEL_START_DELAY_TICKS, ScheduledAction::StartWave);
        log::info!(
            "Level {} started: {} waypoints, {} gold",
            self.level,
            self.map.path.len(),
            self.gold_display()
        );
    }

    /// Move on to the next level once the current one is complete
    pub fn advance_level(&mut self) -> Result<(), CommandError> {
        if self.phase != GamePhase::LevelComplete {
            return Err(CommandError::LevelInProgress);
        }
        self.level += 1;
        self.start_level();
        Ok(())
    }

    pub fn is_unlocked(&self, kind: TowerKind) -> bool {
        self.wave >= self.tower_stats(kind).unlock_wave
    }

    fn require_gold(&self, needed: u32) -> Result<(), CommandError> {
        if self.gold < needed as f32 {
            return Err(CommandError::InsufficientGold {
                needed,
                available: self.gold_display(),
            });
        }
        Ok(())
    }

    /// Check whether a tower of `kind` may be built at `pos`
    pub fn check_placement(&self, kind: TowerKind, pos: Vec2) -> Result<(), CommandError> {
        let stats = self.tower_stats(kind);
        if !self.is_unlocked(kind) {
            return Err(CommandError::Locked {
                kind,
                unlock_wave: stats.unlock_wave,
            });
        }
        self.require_gold(stats.cost)?;
        if self.towers.len() >= self.max_towers {
            return Err(CommandError::TowerLimitReached {
                limit: self.max_towers,
            });
        }
        if self
            .map
            .castle()
            .is_some_and(|castle| pos.distance(castle) < CASTLE_CLEARANCE)
        {
            return Err(CommandError::TooCloseToCastle);
        }
        if self
            .towers
            .iter()
            .any(|t| t.pos.distance(pos) < TOWER_CLEARANCE)
        {
            return Err(CommandError::TooCloseToTower);
        }
        if dist_to_polyline_sq(pos, &self.map.path) < ROAD_CLEARANCE * ROAD_CLEARANCE {
            return Err(CommandError::OnRoad);
        }
        Ok(())
    }

    /// Build a tower, paying its cost
    pub fn try_build(&mut self, kind: TowerKind, pos: Vec2) -> Result<TowerId, CommandError> {
        if let Err(err) = self.check_placement(kind, pos) {
            log::debug!("Rejected {kind:?} at ({:.0}, {:.0}): {err}", pos.x, pos.y);
            return Err(err);
        }

        let cost = self.tower_stats(kind).cost;
        self.gold -= cost as f32;
        let id = self.next_entity_id();
        self.towers.push(Tower::new(id, kind, pos, cost));
        log::debug!("Built {kind:?} {id} at ({:.0}, {:.0})", pos.x, pos.y);
        Ok(id)
    }

    /// Gold needed to raise `tower` one level
    pub fn upgrade_cost(&self, tower: &Tower) -> u32 {
        let base = self.tower_stats(tower.kind).cost as f32;
        (base * self.tuning.economy.upgrade_cost_factor * tower.level as f32).floor() as u32
    }

    fn tower_index(&self, id: TowerId) -> Result<usize, CommandError> {
        self.towers
            .iter()
            .position(|t| t.id == id)
            .ok_or(CommandError::UnknownTower(id))
    }

    /// Upgrade a tower, returning the gold spent
    pub fn upgrade_tower(&mut self, id: TowerId) -> Result<u32, CommandError> {
        let index = self.tower_index(id)?;
        let cost = self.upgrade_cost(&self.towers[index]);
        self.require_gold(cost)?;

        let economy = &self.tuning.economy;
        let tower = &mut self.towers[index];
        tower.level += 1;
        tower.total_cost += cost;
        tower.damage_mult += economy.upgrade_damage_step;
        tower.range_mult += economy.upgrade_range_step;
        let level = tower.level;
        self.gold -= cost as f32;

        log::debug!("Upgraded tower {id} to level {level} for {cost} gold");
        Ok(cost)
    }

    /// Sell a tower, returning the refund
    pub fn sell_tower(&mut self, id: TowerId) -> Result<u32, CommandError> {
        let index = self.tower_index(id)?;
        let tower = self.towers.remove(index);
        let refund = (tower.total_cost as f32 * self.tuning.economy.sell_refund).floor() as u32;
        self.gold += refund as f32;
        log::debug!("Sold {:?} {id} for {refund} gold", tower.kind);
        Ok(refund)
    }

    /// Raise the tower limit by one, returning the price paid
    pub fn buy_tower_slot(&mut self) -> Result<u32, CommandError> {
        let cost = self.tower_slot_cost;
        self.require_gold(cost)?;

        self.gold -= cost as f32;
        self.max_towers += 1;
        self.tower_slot_cost =
            (cost as f32 * self.tuning.economy.slot_cost_growth).floor() as u32;
        log::debug!(
            "Tower limit raised to {}, next slot costs {}",
            self.max_towers,
            self.tower_slot_cost
        );
        Ok(cost)
    }

    /// The first tower within clicking distance of `pos`
    pub fn tower_at(&self, pos: Vec2) -> Option<&Tower> {
        self.towers
            .iter()
            .find(|t| t.pos.distance(pos) < TOWER_SELECT_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    /// A level with a known road: (0,300) -> (400,300) -> (400,500)
    fn shop() -> GameState {
        let mut state = GameState::new(11, Tuning::default());
        state.scheduled.clear();
        state.map.path = vec![
            Vec2::new(0.0, 300.0),
            Vec2::new(400.0, 300.0),
            Vec2::new(400.0, 500.0),
        ];
        state.gold = 1000.0;
        state
    }

    #[test]
    fn test_level_start_grants_bonus() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.gold, 200.0);
        assert_eq!(state.lives, 10);
        assert_eq!(state.wave, 1);
        assert_eq!(state.max_towers, 5);
        assert_eq!(state.tower_slot_cost, 500);
        assert!(!state.map.path.is_empty());
        assert_eq!(state.scheduled.len(), 1);
    }

    #[test]
    fn test_build_deducts_cost() {
        let mut state = shop();
        let id = state
            .try_build(TowerKind::Archer, Vec2::new(100.0, 250.0))
            .expect("valid spot");
        assert_eq!(state.gold, 950.0);
        let tower = state.tower(id).expect("built");
        assert_eq!(tower.level, 1);
        assert_eq!(tower.cooldown, 0);
        assert_eq!(tower.total_cost, 50);
    }

    #[test]
    fn test_rejects_insufficient_gold() {
        let mut state = shop();
        state.gold = 119.5;
        let err = state.try_build(TowerKind::Cannon, Vec2::new(100.0, 200.0));
        assert_eq!(
            err,
            Err(CommandError::InsufficientGold {
                needed: 120,
                available: 119
            })
        );
        assert!(state.towers.is_empty());
        assert_eq!(state.gold, 119.5);
    }

    #[test]
    fn test_rejects_full_tower_limit() {
        let mut state = shop();
        state.max_towers = 2;
        state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("first");
        state.try_build(TowerKind::Archer, Vec2::new(200.0, 200.0)).expect("second");
        assert_eq!(
            state.try_build(TowerKind::Archer, Vec2::new(300.0, 200.0)),
            Err(CommandError::TowerLimitReached { limit: 2 })
        );
    }

    #[test]
    fn test_rejects_near_castle() {
        let mut state = shop();
        // 49 px from the castle
        assert_eq!(
            state.try_build(TowerKind::Archer, Vec2::new(439.0, 530.0)),
            Err(CommandError::TooCloseToCastle)
        );
    }

    #[test]
    fn test_rejects_near_tower() {
        let mut state = shop();
        state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("first");
        assert_eq!(
            state.try_build(TowerKind::Ice, Vec2::new(129.0, 200.0)),
            Err(CommandError::TooCloseToTower)
        );
        assert!(state.try_build(TowerKind::Ice, Vec2::new(130.0, 200.0)).is_ok());
    }

    #[test]
    fn test_rejects_on_road() {
        let mut state = shop();
        assert_eq!(
            state.try_build(TowerKind::Archer, Vec2::new(200.0, 271.0)),
            Err(CommandError::OnRoad)
        );
        // Inside the corner of the second segment
        assert_eq!(
            state.try_build(TowerKind::Archer, Vec2::new(420.0, 400.0)),
            Err(CommandError::OnRoad)
        );
        assert!(state.try_build(TowerKind::Archer, Vec2::new(200.0, 270.0)).is_ok());
    }

    #[test]
    fn test_rejects_locked_kind() {
        let mut state = shop();
        assert_eq!(
            state.try_build(TowerKind::Tesla, Vec2::new(100.0, 200.0)),
            Err(CommandError::Locked {
                kind: TowerKind::Tesla,
                unlock_wave: 5
            })
        );
        state.wave = 5;
        assert!(state.try_build(TowerKind::Tesla, Vec2::new(100.0, 200.0)).is_ok());
    }

    #[test]
    fn test_upgrade_scales_with_level() {
        let mut state = shop();
        let id = state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("built");

        assert_eq!(state.upgrade_tower(id), Ok(75));
        assert_eq!(state.upgrade_tower(id), Ok(150));
        let tower = state.tower(id).expect("tower");
        assert_eq!(tower.level, 3);
        assert_eq!(tower.total_cost, 275);
        assert!((tower.damage_mult - 2.0).abs() < 1e-6);
        assert!((tower.range_mult - 1.4).abs() < 1e-6);
        assert_eq!(state.gold, 1000.0 - 275.0);
    }

    #[test]
    fn test_upgrade_needs_gold() {
        let mut state = shop();
        let id = state.try_build(TowerKind::Cannon, Vec2::new(100.0, 200.0)).expect("built");
        state.gold = 100.0;
        assert!(matches!(
            state.upgrade_tower(id),
            Err(CommandError::InsufficientGold { needed: 180, .. })
        ));
        assert_eq!(state.tower(id).expect("tower").level, 1);
        assert_eq!(state.upgrade_tower(999), Err(CommandError::UnknownTower(999)));
    }

    #[test]
    fn test_sell_refunds_half() {
        let mut state = shop();
        let id = state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("built");
        state.upgrade_tower(id).expect("upgrade");
        let gold = state.gold;

        // (50 + 75) / 2 rounded down
        assert_eq!(state.sell_tower(id), Ok(62));
        assert_eq!(state.gold, gold + 62.0);
        assert!(state.towers.is_empty());
        assert_eq!(state.sell_tower(id), Err(CommandError::UnknownTower(id)));
    }

    #[test]
    fn test_buy_slot() {
        let mut state = shop();
        state.gold = 500.0;
        assert_eq!(state.buy_tower_slot(), Ok(500));
        assert_eq!(state.gold, 0.0);
        assert_eq!(state.max_towers, 6);
        assert_eq!(state.tower_slot_cost, 750);

        assert!(matches!(
            state.buy_tower_slot(),
            Err(CommandError::InsufficientGold { needed: 750, .. })
        ));
        assert_eq!(state.max_towers, 6);
    }

    #[test]
    fn test_tower_at_uses_click_radius() {
        let mut state = shop();
        let id = state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("built");
        assert_eq!(state.tower_at(Vec2::new(110.0, 210.0)).map(|t| t.id), Some(id));
        assert!(state.tower_at(Vec2::new(120.0, 200.0)).is_none());
    }

    #[test]
    fn test_advance_level_only_when_complete() {
        let mut state = shop();
        state.try_build(TowerKind::Archer, Vec2::new(100.0, 200.0)).expect("built");
        state.buy_tower_slot().expect("slot");
        assert_eq!(state.advance_level(), Err(CommandError::LevelInProgress));

        state.phase = GamePhase::LevelComplete;
        state.lives = 3;
        state.wave = 20;
        let gold = state.gold;
        state.advance_level().expect("next level");

        assert_eq!(state.level, 2);
        assert_eq!(state.wave, 1);
        assert_eq!(state.lives, 10);
        assert_eq!(state.gold, gold + 50.0);
        assert!(state.towers.is_empty());
        assert_eq!(state.max_towers, 6);
        assert_eq!(state.tower_slot_cost, 750);
        assert_eq!(state.phase, GamePhase::Running);
    }
}
