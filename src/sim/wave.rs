//! Wave composition, spawn pacing and tick-counted scheduling
//!
//! A wave goes Idle -> queue built -> draining -> cleared. Clearing the last
//! wave of a level completes the level; otherwise the next wave is scheduled
//! after a short break.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

use super::state::{Enemy, EnemyId, EnemyKind, GamePhase, GameState};
use crate::consts::*;
use crate::tuning::WaveTuning;

/// Deferred actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    StartWave,
}

/// An action that fires after a number of ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub remaining_ticks: u32,
    pub action: ScheduledAction,
}

/// How many enemies of each kind wave `wave` releases
pub fn wave_composition(tuning: &WaveTuning, wave: u32) -> [(EnemyKind, u32); 3] {
    let scaled = |rate: f32| (wave as f64 * rate as f64).floor() as u32;
    [
        (EnemyKind::Orc, tuning.base_orcs + scaled(tuning.orcs_per_wave)),
        (EnemyKind::Bat, scaled(tuning.bats_per_wave)),
        (EnemyKind::Golem, scaled(tuning.golems_per_wave)),
    ]
}

/// Build the shuffled spawn order for a wave
///
/// `SliceRandom::shuffle` is a Fisher-Yates shuffle, so every permutation is
/// equally likely.
pub fn build_spawn_queue<R: Rng + ?Sized>(
    rng: &mut R,
    tuning: &WaveTuning,
    wave: u32,
) -> VecDeque<EnemyKind> {
    let mut queue: Vec<EnemyKind> = wave_composition(tuning, wave)
        .into_iter()
        .flat_map(|(kind, count)| std::iter::repeat_n(kind, count as usize))
        .collect();
    queue.shuffle(rng);
    queue.into()
}

/// Hit point multiplier applied to every enemy spawned in `wave` of `level`
pub fn hp_multiplier(tuning: &WaveTuning, level: u32, wave: u32) -> f32 {
    1.0 + level as f32 * tuning.hp_per_level + wave as f32 * tuning.hp_per_wave
}

impl GameState {
    /// Queue an action `delay_ticks` ticks from now
    pub fn schedule(&mut self, delay_ticks: u32, action: ScheduledAction) {
        self.scheduled.push(ScheduledEvent {
            remaining_ticks: delay_ticks,
            action,
        });
    }

    /// Build the spawn queue for the current wave and mark it active
    pub fn start_wave(&mut self) {
        self.spawn_queue = build_spawn_queue(&mut self.rng, &self.tuning.waves, self.wave);
        self.wave_active = true;
        log::info!(
            "Level {} wave {}/{} started: {} enemies",
            self.level,
            self.wave,
            self.tuning.waves.max_waves,
            self.spawn_queue.len()
        );
    }

    /// Spawn one enemy at the start of the road
    pub fn spawn_enemy(&mut self, kind: EnemyKind) -> EnemyId {
        let stats = self.tuning.enemies.get(kind);
        let hp = stats.hp * hp_multiplier(&self.tuning.waves, self.level, self.wave);
        let speed = stats.speed;
        let reward = stats.reward;
        let pos = self.map.path.first().copied().unwrap_or_default();

        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            kind,
            pos,
            wp: 0,
            hp,
            max_hp: hp,
            speed,
            reward,
            frozen: 0,
            reached: false,
        });
        id
    }
}

/// Count down scheduled events and run the ones that are due
pub fn advance_schedule(state: &mut GameState) {
    let mut due = Vec::new();
    state.scheduled.retain_mut(|event| {
        event.remaining_ticks = event.remaining_ticks.saturating_sub(1);
        if event.remaining_ticks == 0 {
            due.push(event.action);
            false
        } else {
            true
        }
    });

    for action in due {
        match action {
            ScheduledAction::StartWave => state.start_wave(),
        }
    }
}

/// Drain the spawn queue and detect wave/level completion
pub fn update_waves(state: &mut GameState) {
    if !state.spawn_queue.is_empty() {
        state.spawn_timer += 1;
        if state.spawn_timer > SPAWN_INTERVAL_TICKS {
            if let Some(kind) = state.spawn_queue.pop_front() {
                state.spawn_enemy(kind);
            }
            state.spawn_timer = 0;
        }
    } else if state.enemies.is_empty() && state.wave_active {
        state.wave_active = false;
        if state.wave < state.tuning.waves.max_waves {
            log::info!("Wave {} cleared", state.wave);
            state.wave += 1;
            state.schedule(WAVE_BREAK_TICKS, ScheduledAction::StartWave);
        } else {
            log::info!("Level {} complete", state.level);
            state.phase = GamePhase::LevelComplete;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn quiet_state() -> GameState {
        let mut state = GameState::new(1234, Tuning::default());
        state.scheduled.clear();
        state
    }

    fn count(queue: &VecDeque<EnemyKind>, kind: EnemyKind) -> u32 {
        queue.iter().filter(|k| **k == kind).count() as u32
    }

    #[test]
    fn test_wave_one_composition() {
        let tuning = WaveTuning::default();
        assert_eq!(
            wave_composition(&tuning, 1),
            [(EnemyKind::Orc, 5), (EnemyKind::Bat, 0), (EnemyKind::Golem, 0)]
        );
        assert_eq!(
            wave_composition(&tuning, 10),
            [(EnemyKind::Orc, 10), (EnemyKind::Bat, 4), (EnemyKind::Golem, 2)]
        );
    }

    #[test]
    fn test_hp_multiplier() {
        let tuning = WaveTuning::default();
        assert!((hp_multiplier(&tuning, 1, 1) - 1.35).abs() < 1e-6);
        assert!((hp_multiplier(&tuning, 2, 10) - 2.9).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_scales_hp_only() {
        let mut state = quiet_state();
        state.level = 2;
        state.wave = 4;
        let id = state.spawn_enemy(EnemyKind::Golem);
        let golem = state.enemy(id).expect("spawned");
        // 150 * (1 + 0.4 + 0.6)
        assert!((golem.hp - 300.0).abs() < 1e-3);
        assert_eq!(golem.hp, golem.max_hp);
        assert_eq!(golem.speed, 0.8);
        assert_eq!(golem.reward, 50);
        assert_eq!(golem.wp, 0);
        assert_eq!(golem.pos, state.map.path[0]);
    }

    #[test]
    fn test_spawn_pacing() {
        let mut state = quiet_state();
        state.start_wave();
        assert!(state.wave_active);
        assert_eq!(state.spawn_queue.len(), 5);

        for _ in 0..SPAWN_INTERVAL_TICKS {
            update_waves(&mut state);
        }
        assert!(state.enemies.is_empty());

        update_waves(&mut state);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.spawn_queue.len(), 4);
        assert_eq!(state.spawn_timer, 0);
    }

    #[test]
    fn test_cleared_wave_schedules_next() {
        let mut state = quiet_state();
        state.wave_active = true;
        update_waves(&mut state);

        assert!(!state.wave_active);
        assert_eq!(state.wave, 2);
        assert_eq!(
            state.scheduled,
            vec![ScheduledEvent {
                remaining_ticks: WAVE_BREAK_TICKS,
                action: ScheduledAction::StartWave
            }]
        );
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_wave_not_cleared_while_enemies_alive() {
        let mut state = quiet_state();
        state.wave_active = true;
        state.spawn_enemy(EnemyKind::Orc);
        update_waves(&mut state);
        assert!(state.wave_active);
        assert_eq!(state.wave, 1);
    }

    #[test]
    fn test_last_wave_completes_level() {
        let mut state = quiet_state();
        state.wave = state.tuning.waves.max_waves;
        state.wave_active = true;
        update_waves(&mut state);
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert!(state.scheduled.is_empty());
    }

    #[test]
    fn test_schedule_fires_after_delay() {
        let mut state = quiet_state();
        state.schedule(3, ScheduledAction::StartWave);
        advance_schedule(&mut state);
        advance_schedule(&mut state);
        assert!(!state.wave_active);
        advance_schedule(&mut state);
        assert!(state.wave_active);
        assert!(state.scheduled.is_empty());
    }

    proptest! {
        #[test]
        fn prop_queue_composition(seed in any::<u64>(), wave in 1u32..200) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let tuning = WaveTuning::default();
            let queue = build_spawn_queue(&mut rng, &tuning, wave);

            prop_assert_eq!(count(&queue, EnemyKind::Orc), 5 + wave / 2);
            prop_assert_eq!(count(&queue, EnemyKind::Bat), wave * 2 / 5);
            prop_assert_eq!(count(&queue, EnemyKind::Golem), wave / 5);
            prop_assert_eq!(queue.len() as u32, 5 + wave / 2 + wave * 2 / 5 + wave / 5);
        }
    }
}
