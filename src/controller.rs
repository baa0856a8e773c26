//! Frame-driven game controller
//!
//! Owns the [`GameState`] and translates host events (animation frames,
//! clicks, button presses) into simulation commands. One call to
//! [`SimulationController::frame`] corresponds to one rendered frame and runs
//! 1, 2 or 4 fixed ticks depending on the selected speed.

use glam::Vec2;
use serde::Serialize;

use crate::error::CommandError;
use crate::sim::map::{Decoration, MapColors};
use crate::sim::{
    Enemy, FloatingText, GamePhase, GameState, Particle, Projectile, Tower, TowerId, TowerKind,
    tick,
};
use crate::tuning::Tuning;

/// Simulation speed multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GameSpeed {
    #[default]
    Normal,
    Double,
    Quad,
}

impl GameSpeed {
    pub fn ticks_per_frame(self) -> u32 {
        match self {
            GameSpeed::Normal => 1,
            GameSpeed::Double => 2,
            GameSpeed::Quad => 4,
        }
    }

    /// 1x -> 2x -> 4x -> 1x
    pub fn next(self) -> Self {
        match self {
            GameSpeed::Normal => GameSpeed::Double,
            GameSpeed::Double => GameSpeed::Quad,
            GameSpeed::Quad => GameSpeed::Normal,
        }
    }
}

/// Whether the host should keep requesting frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    /// Level complete or game over; the loop resumes after next-level/restart
    Halt,
}

/// Scalars shown in the UI panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub gold: u32,
    pub lives: u32,
    pub wave: u32,
    pub max_waves: u32,
    pub level: u32,
    pub towers: usize,
    pub max_towers: usize,
    pub slot_cost: u32,
    pub speed: u32,
    pub paused: bool,
    pub phase: GamePhase,
    pub selected_kind: Option<TowerKind>,
    pub selected_tower: Option<TowerId>,
    /// Price of upgrading the selected tower
    pub upgrade_cost: Option<u32>,
}

/// Draws one frame; must not mutate the simulation
pub trait Renderer {
    fn render(&mut self, state: &GameState, hud: &Hud);
}

/// Borrowed view of everything a renderer needs, serializable to JSON
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub hud: &'a Hud,
    pub width: f32,
    pub height: f32,
    pub path: &'a [Vec2],
    pub colors: &'a MapColors,
    pub decorations: &'a [Decoration],
    pub enemies: &'a [Enemy],
    pub towers: &'a [Tower],
    pub projectiles: &'a [Projectile],
    pub particles: &'a [Particle],
    pub floating_texts: &'a [FloatingText],
}

impl<'a> Snapshot<'a> {
    pub fn new(state: &'a GameState, hud: &'a Hud) -> Self {
        Self {
            hud,
            width: state.map.width,
            height: state.map.height,
            path: &state.map.path,
            colors: &state.map.colors,
            decorations: &state.map.decorations,
            enemies: &state.enemies,
            towers: &state.towers,
            projectiles: &state.projectiles,
            particles: &state.particles,
            floating_texts: &state.floating_texts,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Result of a click on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(TowerId),
    Built(TowerId),
}

/// Game session driven by the host's frame scheduler
#[derive(Debug, Clone)]
pub struct SimulationController {
    state: GameState,
    speed: GameSpeed,
    /// Tower kind armed for the next build click
    selected_kind: Option<TowerKind>,
    /// Built tower currently shown in the upgrade/sell panel
    selected_tower: Option<TowerId>,
}

impl SimulationController {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            state: GameState::new(seed, tuning),
            speed: GameSpeed::Normal,
            selected_kind: None,
            selected_tower: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn speed(&self) -> GameSpeed {
        self.speed
    }

    /// Render and advance one frame
    ///
    /// A paused game still renders. A halted game renders nothing and asks the
    /// host to stop scheduling frames.
    pub fn frame(&mut self, renderer: &mut dyn Renderer) -> FrameOutcome {
        if self.state.phase.is_halted() {
            return FrameOutcome::Halt;
        }

        let hud = self.hud();
        renderer.render(&self.state, &hud);

        if self.state.phase == GamePhase::Paused {
            return FrameOutcome::Continue;
        }

        for _ in 0..self.speed.ticks_per_frame() {
            tick(&mut self.state);
            if self.state.phase.is_halted() {
                return FrameOutcome::Halt;
            }
        }
        FrameOutcome::Continue
    }

    /// Flip between running and paused; no effect once halted
    pub fn toggle_pause(&mut self) -> GamePhase {
        self.state.phase = match self.state.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            halted => halted,
        };
        log::info!("Phase: {:?}", self.state.phase);
        self.state.phase
    }

    pub fn cycle_speed(&mut self) -> GameSpeed {
        self.speed = self.speed.next();
        log::info!("Speed {}x", self.speed.ticks_per_frame());
        self.speed
    }

    /// Arm a tower kind for building
    pub fn select_tower_kind(&mut self, kind: TowerKind) -> Result<(), CommandError> {
        if !self.state.is_unlocked(kind) {
            let err = CommandError::Locked {
                kind,
                unlock_wave: self.state.tower_stats(kind).unlock_wave,
            };
            log::debug!("{err}");
            return Err(err);
        }
        self.selected_kind = Some(kind);
        self.selected_tower = None;
        Ok(())
    }

    /// Handle a click at canvas coordinates
    ///
    /// Clicking an existing tower selects it. Otherwise the armed tower kind
    /// is built there and disarmed whether or not the build succeeded.
    pub fn click(&mut self, pos: Vec2) -> Result<ClickOutcome, CommandError> {
        if self.state.phase != GamePhase::Running {
            return Err(CommandError::Halted);
        }

        if let Some(id) = self.state.tower_at(pos).map(|t| t.id) {
            self.selected_tower = Some(id);
            self.selected_kind = None;
            return Ok(ClickOutcome::Selected(id));
        }

        self.selected_tower = None;
        let kind = self.selected_kind.take().ok_or(CommandError::NoTowerSelected)?;
        self.state.try_build(kind, pos).map(ClickOutcome::Built)
    }

    fn selected(&self) -> Result<TowerId, CommandError> {
        self.selected_tower.ok_or(CommandError::NoTowerSelected)
    }

    pub fn upgrade_selected(&mut self) -> Result<u32, CommandError> {
        let id = self.selected()?;
        self.state.upgrade_tower(id)
    }

    pub fn sell_selected(&mut self) -> Result<u32, CommandError> {
        let id = self.selected()?;
        let refund = self.state.sell_tower(id)?;
        self.selected_tower = None;
        Ok(refund)
    }

    pub fn buy_tower_slot(&mut self) -> Result<u32, CommandError> {
        self.state.buy_tower_slot()
    }

    /// Start the next level after a completed one
    pub fn next_level(&mut self) -> Result<(), CommandError> {
        self.state.advance_level()?;
        self.selected_kind = None;
        self.selected_tower = None;
        Ok(())
    }

    /// Throw the current game away and start over
    pub fn restart(&mut self, seed: u64) {
        let tuning = self.state.tuning.clone();
        log::info!("Restarting with seed {seed}");
        self.state = GameState::new(seed, tuning);
        self.selected_kind = None;
        self.selected_tower = None;
    }

    pub fn hud(&self) -> Hud {
        let state = &self.state;
        Hud {
            gold: state.gold_display(),
            lives: state.lives,
            wave: state.wave,
            max_waves: state.tuning.waves.max_waves,
            level: state.level,
            towers: state.towers.len(),
            max_towers: state.max_towers,
            slot_cost: state.tower_slot_cost,
            speed: self.speed.ticks_per_frame(),
            paused: state.phase == GamePhase::Paused,
            phase: state.phase,
            selected_kind: self.selected_kind,
            selected_tower: self.selected_tower,
            upgrade_cost: self
                .selected_tower
                .and_then(|id| state.tower(id))
                .map(|t| state.upgrade_cost(t)),
        }
    }

    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        let hud = self.hud();
        Snapshot::new(&self.state, &hud).to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingRenderer {
        frames: u32,
        last_tick: u64,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, state: &GameState, _hud: &Hud) {
            self.frames += 1;
            self.last_tick = state.time_ticks;
        }
    }

    /// Controller with a straight road along y = 300
    fn controller() -> SimulationController {
        let mut ctl = SimulationController::new(3, Tuning::default());
        let state = ctl.state_mut();
        state.map.path = vec![Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0)];
        state.gold = 1000.0;
        ctl
    }

    #[test]
    fn test_speed_cycles() {
        let mut ctl = controller();
        assert_eq!(ctl.speed().ticks_per_frame(), 1);
        assert_eq!(ctl.cycle_speed().ticks_per_frame(), 2);
        assert_eq!(ctl.cycle_speed().ticks_per_frame(), 4);
        assert_eq!(ctl.cycle_speed().ticks_per_frame(), 1);
    }

    #[test]
    fn test_frame_runs_speed_ticks() {
        let mut ctl = controller();
        let mut renderer = CountingRenderer::default();
        ctl.cycle_speed();
        ctl.cycle_speed();

        assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Continue);
        assert_eq!(ctl.state().time_ticks, 4);
        // Rendered before the ticks ran
        assert_eq!(renderer.last_tick, 0);
        assert_eq!(renderer.frames, 1);
    }

    #[test]
    fn test_paused_frame_renders_without_ticking() {
        let mut ctl = controller();
        let mut renderer = CountingRenderer::default();
        assert_eq!(ctl.toggle_pause(), GamePhase::Paused);
        assert!(ctl.hud().paused);

        for _ in 0..3 {
            assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Continue);
        }
        assert_eq!(renderer.frames, 3);
        assert_eq!(ctl.state().time_ticks, 0);

        assert_eq!(ctl.toggle_pause(), GamePhase::Running);
        ctl.frame(&mut renderer);
        assert_eq!(ctl.state().time_ticks, 1);
    }

    #[test]
    fn test_halted_frame_stops_loop() {
        let mut ctl = controller();
        let mut renderer = CountingRenderer::default();
        ctl.state_mut().phase = GamePhase::GameOver;

        assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Halt);
        assert_eq!(renderer.frames, 0);
        // Pausing cannot resurrect a finished game
        assert_eq!(ctl.toggle_pause(), GamePhase::GameOver);
    }

    #[test]
    fn test_halt_mid_frame_skips_remaining_ticks() {
        let mut ctl = controller();
        let mut renderer = CountingRenderer::default();
        ctl.cycle_speed();
        ctl.cycle_speed();
        let state = ctl.state_mut();
        state.scheduled.clear();
        state.lives = 1;
        state.spawn_enemy(crate::sim::EnemyKind::Bat);
        state.enemies[0].pos = Vec2::new(797.0, 300.0);

        assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Halt);
        assert_eq!(ctl.state().time_ticks, 1);
        assert_eq!(ctl.state().phase, GamePhase::GameOver);
    }

    #[test]
    fn test_locked_kind_cannot_be_selected() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.select_tower_kind(TowerKind::Tesla),
            Err(CommandError::Locked { unlock_wave: 5, .. })
        ));
        assert_eq!(ctl.hud().selected_kind, None);
        assert!(ctl.select_tower_kind(TowerKind::Ice).is_ok());
        assert_eq!(ctl.hud().selected_kind, Some(TowerKind::Ice));
    }

    #[test]
    fn test_click_builds_then_selects() {
        let mut ctl = controller();
        let spot = Vec2::new(200.0, 200.0);

        assert_eq!(ctl.click(spot), Err(CommandError::NoTowerSelected));

        ctl.select_tower_kind(TowerKind::Archer).expect("unlocked");
        let Ok(ClickOutcome::Built(id)) = ctl.click(spot) else {
            panic!("expected a build");
        };
        assert_eq!(ctl.hud().towers, 1);
        // The armed kind is consumed by the build
        assert_eq!(ctl.hud().selected_kind, None);

        assert_eq!(ctl.click(spot + Vec2::new(5.0, 5.0)), Ok(ClickOutcome::Selected(id)));
        assert_eq!(ctl.hud().upgrade_cost, Some(75));
    }

    #[test]
    fn test_failed_build_disarms() {
        let mut ctl = controller();
        ctl.select_tower_kind(TowerKind::Archer).expect("unlocked");
        assert_eq!(ctl.click(Vec2::new(200.0, 310.0)), Err(CommandError::OnRoad));
        assert_eq!(ctl.hud().selected_kind, None);
        assert_eq!(ctl.state().gold, 1000.0);
    }

    #[test]
    fn test_clicks_ignored_while_paused() {
        let mut ctl = controller();
        ctl.select_tower_kind(TowerKind::Archer).expect("unlocked");
        ctl.toggle_pause();
        assert_eq!(ctl.click(Vec2::new(200.0, 200.0)), Err(CommandError::Halted));
        assert!(ctl.state().towers.is_empty());
    }

    #[test]
    fn test_upgrade_and_sell_selected() {
        let mut ctl = controller();
        assert_eq!(ctl.upgrade_selected(), Err(CommandError::NoTowerSelected));

        ctl.select_tower_kind(TowerKind::Cannon).expect("unlocked");
        ctl.click(Vec2::new(200.0, 200.0)).expect("built");
        ctl.click(Vec2::new(200.0, 200.0)).expect("selected");

        assert_eq!(ctl.upgrade_selected(), Ok(180));
        assert_eq!(ctl.sell_selected(), Ok(150));
        assert_eq!(ctl.hud().selected_tower, None);
        assert_eq!(ctl.state().gold, 1000.0 - 120.0 - 180.0 + 150.0);
    }

    #[test]
    fn test_next_level_and_restart() {
        let mut ctl = controller();
        assert_eq!(ctl.next_level(), Err(CommandError::LevelInProgress));

        ctl.state_mut().phase = GamePhase::LevelComplete;
        let mut renderer = CountingRenderer::default();
        assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Halt);
        ctl.next_level().expect("level complete");
        assert_eq!(ctl.hud().level, 2);
        assert_eq!(ctl.frame(&mut renderer), FrameOutcome::Continue);

        ctl.restart(99);
        let hud = ctl.hud();
        assert_eq!(hud.level, 1);
        assert_eq!(hud.gold, 200);
        assert_eq!(ctl.state().seed, 99);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut ctl = controller();
        ctl.state_mut().spawn_enemy(crate::sim::EnemyKind::Orc);
        let json = ctl.snapshot_json().expect("serializable");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["hud"]["lives"], 10);
        assert_eq!(value["enemies"][0]["kind"], "orc");
        assert_eq!(value["path"].as_array().map(|p| p.len()), Some(2));
    }
}
