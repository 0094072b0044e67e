//! Reference model of the survival runtime
//!
//! [`SurvivalRun`] mirrors the state machine, spawn bookkeeping and object
//! motion of the script emitted by the survival template, driven by explicit
//! frame deltas and a seeded generator instead of the browser clock.

use crate::params::SurvivalParams;
use crate::schedule::SpawnSchedule;
use gamespec_model::LimitRule;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Longest frame delta fed to the simulation
pub const MAX_FRAME_MS: f64 = 66.0;
/// Delta assumed when a frame reports no elapsed time
pub const DEFAULT_FRAME_MS: f64 = 16.0;
/// Length of the pop animation
pub const POP_MS: f64 = 160.0;

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Start overlay shown
    Idle,
    /// Spawn/update loop active
    Running,
    /// Loop frozen, waiting for unpause
    Paused,
    /// Final overlay with elapsed time
    Ended,
}

/// One live object
#[derive(Debug, Clone, PartialEq)]
pub struct Orb {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub heading: f64,
    pub speed: f64,
    pub wobble_amp: f64,
    pub wobble_freq: f64,
    pub phase: f64,
    pub color: usize,
    /// Milliseconds into the pop animation; zero while intact
    pub pop_ms: f64,
}

impl Orb {
    /// Whether the orb is playing its pop animation
    #[inline]
    #[must_use]
    pub fn is_popping(&self) -> bool {
        self.pop_ms > 0.0
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let (dx, dy) = (x - self.x, y - self.y);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Palette size used when picking orb colours
pub const PALETTE_LEN: usize = 8;

/// Deterministic simulation of one survival session
#[derive(Debug, Clone)]
pub struct SurvivalRun {
    schedule: SpawnSchedule,
    limit: LimitRule,
    width: f64,
    height: f64,
    rng: StdRng,
    state: RunState,
    elapsed_ms: f64,
    window_index: u64,
    spawned_in_window: u64,
    total_spawned: u64,
    orbs: Vec<Orb>,
    best_ms: Option<f64>,
}

impl SurvivalRun {
    /// New idle run
    #[must_use]
    pub fn new(params: &SurvivalParams, seed: u64) -> Self {
        Self {
            schedule: SpawnSchedule::new(&params.spawn),
            limit: params.limit,
            width: f64::from(params.scene.width),
            height: f64::from(params.scene.height),
            rng: StdRng::seed_from_u64(seed),
            state: RunState::Idle,
            elapsed_ms: 0.0,
            window_index: 0,
            spawned_in_window: 0,
            total_spawned: 0,
            orbs: Vec::new(),
            best_ms: None,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Running time of the current session
    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Objects currently on screen, popping ones included
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.orbs.len()
    }

    /// Objects spawned since the session started
    #[inline]
    #[must_use]
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Active window index
    #[inline]
    #[must_use]
    pub fn window_index(&self) -> u64 {
        self.window_index
    }

    /// Live objects, bottom-most first
    #[inline]
    #[must_use]
    pub fn orbs(&self) -> &[Orb] {
        &self.orbs
    }

    /// Best recorded time across sessions of this run
    #[inline]
    #[must_use]
    pub fn best_ms(&self) -> Option<f64> {
        self.best_ms
    }

    /// Spawn schedule in use
    #[inline]
    #[must_use]
    pub fn schedule(&self) -> &SpawnSchedule {
        &self.schedule
    }

    /// Start from idle, or replay after the end
    ///
    /// Ignored while running or paused.
    pub fn start(&mut self) {
        if matches!(self.state, RunState::Running | RunState::Paused) {
            return;
        }
        self.orbs.clear();
        self.elapsed_ms = 0.0;
        self.window_index = 0;
        self.spawned_in_window = 0;
        self.total_spawned = 0;
        self.state = RunState::Running;
    }

    /// Toggle between running and paused
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
            other => other,
        };
    }

    /// Advance one frame
    ///
    /// The delta is clamped to [`MAX_FRAME_MS`]; a non-positive delta counts
    /// as [`DEFAULT_FRAME_MS`]. Only a running session advances.
    pub fn advance(&mut self, frame_ms: f64) {
        if self.state != RunState::Running {
            return;
        }
        let dt = if frame_ms > 0.0 {
            frame_ms.min(MAX_FRAME_MS)
        } else {
            DEFAULT_FRAME_MS
        };
        self.elapsed_ms += dt;

        self.spawn_due();
        self.move_orbs(dt);

        if self.limit.end_on_limit && self.orbs.len() >= self.limit.max_concurrent as usize {
            self.end();
        }
    }

    /// Pop the top-most intact object under a point
    ///
    /// Returns whether an object was hit. Popping never touches the spawn
    /// counters.
    pub fn pop_at(&mut self, x: f64, y: f64) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        match self.orbs.iter_mut().rev().find(|o| o.contains(x, y)) {
            Some(orb) => {
                if !orb.is_popping() {
                    orb.pop_ms = 1.0;
                }
                true
            }
            None => false,
        }
    }

    fn spawn_due(&mut self) {
        let index = self.schedule.window_index(self.elapsed_ms);
        if index != self.window_index {
            self.window_index = index;
            self.spawned_in_window = 0;
        }

        let mut quota = self.schedule.frame_quota(index, self.spawned_in_window);
        // Without an end on the limit, spawning holds at the ceiling.
        if !self.limit.end_on_limit {
            let room = (self.limit.max_concurrent as usize).saturating_sub(self.orbs.len());
            quota = quota.min(room as u64);
        }

        for _ in 0..quota {
            let orb = self.random_orb();
            self.orbs.push(orb);
        }
        self.spawned_in_window += quota;
        self.total_spawned += quota;
    }

    fn random_orb(&mut self) -> Orb {
        let radius = self.rng.random_range(14.0..48.0);
        let x = self.rng.random_range(radius..(self.width - radius).max(radius + 1.0));
        let y = self.rng.random_range(radius..(self.height - radius).max(radius + 1.0));
        Orb {
            x,
            y,
            radius,
            heading: self.rng.random_range(0.0..PI * 2.0),
            speed: self.rng.random_range(10.0..40.0),
            wobble_amp: self.rng.random_range(0.5..2.2),
            wobble_freq: self.rng.random_range(1.0..2.4),
            phase: self.rng.random_range(0.0..PI * 2.0),
            color: self.rng.random_range(0..PALETTE_LEN),
            pop_ms: 0.0,
        }
    }

    fn move_orbs(&mut self, dt: f64) {
        let secs = dt / 1000.0;
        let (w, h) = (self.width, self.height);
        for orb in &mut self.orbs {
            orb.x += orb.heading.cos() * orb.speed * secs;
            orb.y += orb.heading.sin() * orb.speed * secs;
            orb.phase += orb.wobble_freq * secs;
            let wobble = orb.phase.sin() * orb.wobble_amp;
            orb.x += wobble;
            orb.y -= wobble * 0.6;

            // Reflect off the violated axis.
            if orb.x < orb.radius {
                orb.x = orb.radius;
                orb.heading = PI - orb.heading;
            }
            if orb.x > w - orb.radius {
                orb.x = w - orb.radius;
                orb.heading = PI - orb.heading;
            }
            if orb.y < orb.radius {
                orb.y = orb.radius;
                orb.heading = -orb.heading;
            }
            if orb.y > h - orb.radius {
                orb.y = h - orb.radius;
                orb.heading = -orb.heading;
            }

            if orb.is_popping() {
                orb.pop_ms += dt;
            }
        }
        self.orbs.retain(|o| o.pop_ms <= POP_MS);
    }

    fn end(&mut self) {
        self.state = RunState::Ended;
        self.record_if_better(self.elapsed_ms);
    }

    /// Keep `time_ms` as the best time when it beats the current record
    pub fn record_if_better(&mut self, time_ms: f64) -> bool {
        if self.best_ms.is_some_and(|best| best >= time_ms) {
            return false;
        }
        self.best_ms = Some(time_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamespec_model::SpawnRule;
    use serde_json::json;

    fn params(spec: &serde_json::Value) -> SurvivalParams {
        SurvivalParams::from_spec(spec)
    }

    fn unlimited() -> SurvivalParams {
        params(&json!({"rules": {"limit": {"max_concurrent": 10000}}}))
    }

    #[test]
    fn lifecycle_transitions() {
        let mut run = SurvivalRun::new(&unlimited(), 1);
        assert_eq!(run.state(), RunState::Idle);
        run.advance(16.0);
        assert_eq!(run.elapsed_ms(), 0.0);

        run.start();
        assert_eq!(run.state(), RunState::Running);
        run.toggle_pause();
        assert_eq!(run.state(), RunState::Paused);
        run.advance(16.0);
        assert_eq!(run.elapsed_ms(), 0.0);
        run.toggle_pause();
        run.advance(16.0);
        assert_eq!(run.elapsed_ms(), 16.0);
    }

    #[test]
    fn frame_delta_is_clamped() {
        let mut run = SurvivalRun::new(&unlimited(), 1);
        run.start();
        run.advance(5000.0);
        assert_eq!(run.elapsed_ms(), MAX_FRAME_MS);
        run.advance(0.0);
        assert_eq!(run.elapsed_ms(), MAX_FRAME_MS + DEFAULT_FRAME_MS);
    }

    #[test]
    fn ends_at_limit_and_records_best() {
        let p = params(&json!({
            "rules": {
                "spawn": {"mode": "linear", "add_per_interval": 5, "interval_ms": 1000},
                "limit": {"max_concurrent": 12, "end_on_limit": true}
            }
        }));
        let mut run = SurvivalRun::new(&p, 7);
        run.start();
        for _ in 0..500 {
            run.advance(16.0);
        }
        assert_eq!(run.state(), RunState::Ended);
        assert!(run.live_count() >= 12);
        // Third window pushes the count past 12.
        assert!(run.elapsed_ms() >= 2000.0 && run.elapsed_ms() < 2100.0);
        assert_eq!(run.best_ms(), Some(run.elapsed_ms()));

        let first = run.elapsed_ms();
        run.start();
        assert_eq!(run.state(), RunState::Running);
        assert_eq!(run.live_count(), 0);
        assert!(!run.record_if_better(first - 1.0));
    }

    #[test]
    fn spawning_holds_at_ceiling_without_end() {
        let p = params(&json!({
            "rules": {
                "spawn": {"mode": "linear", "add_per_interval": 8, "interval_ms": 500},
                "limit": {"max_concurrent": 10, "end_on_limit": false}
            }
        }));
        let mut run = SurvivalRun::new(&p, 3);
        run.start();
        for _ in 0..200 {
            run.advance(16.0);
        }
        assert_eq!(run.state(), RunState::Running);
        assert_eq!(run.live_count(), 10);
    }

    #[test]
    fn popping_does_not_touch_spawn_bookkeeping() {
        let mut run = SurvivalRun::new(&unlimited(), 11);
        run.start();
        for _ in 0..130 {
            run.advance(16.0);
        }
        let spawned = run.total_spawned();
        let targets: Vec<(f64, f64)> = run.orbs().iter().map(|o| (o.x, o.y)).collect();
        for (x, y) in targets {
            run.pop_at(x, y);
        }
        for _ in 0..12 {
            run.advance(16.0);
        }
        assert_eq!(
            run.total_spawned(),
            run.schedule().cumulative_target(run.elapsed_ms())
        );
        assert!(run.total_spawned() >= spawned);
    }

    #[test]
    fn popped_orb_is_removed_after_animation() {
        let p = params(&json!({
            "rules": {
                "spawn": {"mode": "linear", "add_per_interval": 1, "interval_ms": 600000},
                "limit": {"max_concurrent": 50}
            }
        }));
        let mut run = SurvivalRun::new(&p, 5);
        run.start();
        run.advance(16.0);
        assert_eq!(run.live_count(), 1);
        let (x, y) = (run.orbs()[0].x, run.orbs()[0].y);
        assert!(run.pop_at(x, y));
        assert!(!run.pop_at(-500.0, -500.0));
        for _ in 0..12 {
            run.advance(16.0);
        }
        assert_eq!(run.live_count(), 0);
        assert_eq!(run.total_spawned(), 1);
    }

    #[test]
    fn orbs_stay_inside_the_scene() {
        let mut run = SurvivalRun::new(&unlimited(), 99);
        run.start();
        for _ in 0..400 {
            run.advance(33.0);
            for o in run.orbs() {
                assert!(o.x >= o.radius - 1e-9 && o.x <= 800.0 - o.radius + 1e-9);
                assert!(o.y >= o.radius - 1e-9 && o.y <= 500.0 - o.radius + 1e-9);
            }
        }
    }

    #[test]
    fn same_seed_same_run() {
        let p = params(&json!({"rules": {"spawn": SpawnRule::linear(4, 300).to_value()}}));
        let mut a = SurvivalRun::new(&p, 42);
        let mut b = SurvivalRun::new(&p, 42);
        a.start();
        b.start();
        for _ in 0..50 {
            a.advance(20.0);
            b.advance(20.0);
        }
        assert_eq!(a.orbs(), b.orbs());
    }
}
