//! Headless run of the timed-spawn runtime model

use gamespec_compiler::{RunState, SurvivalParams, SurvivalRun};
use gamespec_model::{LimitRule, SpawnMode, SpawnRule};
use serde_json::json;

/// Simulation inputs
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimulationConfig {
    pub(crate) mode: SpawnMode,
    pub(crate) interval_ms: u64,
    pub(crate) add_per_interval: Option<u32>,
    pub(crate) limit: u32,
    pub(crate) end_on_limit: bool,
    pub(crate) seed: u64,
    pub(crate) duration_ms: u64,
    pub(crate) frame_ms: f64,
}

/// Snapshot taken at the first frame of each window
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WindowSample {
    pub(crate) index: u64,
    pub(crate) elapsed_ms: f64,
    pub(crate) total_spawned: u64,
    pub(crate) expected: u64,
    pub(crate) live: usize,
}

/// Simulation result
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimulationReport {
    pub(crate) samples: Vec<WindowSample>,
    pub(crate) final_state: RunState,
    pub(crate) elapsed_ms: f64,
    pub(crate) total_spawned: u64,
    pub(crate) live: usize,
}

impl SimulationReport {
    pub(crate) fn render(&self) -> String {
        let mut out = String::from("window  elapsed_ms  spawned  expected  live\n");
        for s in &self.samples {
            out.push_str(&format!(
                "{:>6}  {:>10.0}  {:>7}  {:>8}  {:>4}\n",
                s.index, s.elapsed_ms, s.total_spawned, s.expected, s.live
            ));
        }
        let outcome = match self.final_state {
            RunState::Ended => format!("ended at {:.2}s", self.elapsed_ms / 1000.0),
            _ => format!("still running after {:.2}s", self.elapsed_ms / 1000.0),
        };
        out.push_str(&format!(
            "{outcome}: {} spawned, {} live\n",
            self.total_spawned, self.live
        ));
        out
    }
}

/// Drive a run with fixed frame steps, sampling once per window
#[allow(clippy::cast_precision_loss)]
pub(crate) fn run(config: &SimulationConfig) -> SimulationReport {
    let spawn = SpawnRule {
        mode: config.mode,
        interval_ms: config.interval_ms,
        add_per_interval: config.add_per_interval,
    };
    let limit = LimitRule {
        max_concurrent: config.limit,
        end_on_limit: config.end_on_limit,
    };
    let spec = json!({
        "meta": {"template": "bubble_clicker"},
        "rules": {"spawn": spawn.to_value(), "limit": limit.to_value()}
    });
    let params = SurvivalParams::from_spec(&spec);
    let mut game = SurvivalRun::new(&params, config.seed);
    game.start();

    let mut samples = Vec::new();
    let mut last_window = None;
    while game.state() == RunState::Running && game.elapsed_ms() < config.duration_ms as f64 {
        game.advance(config.frame_ms);
        let index = game.window_index();
        if last_window != Some(index) {
            last_window = Some(index);
            samples.push(WindowSample {
                index,
                elapsed_ms: game.elapsed_ms(),
                total_spawned: game.total_spawned(),
                expected: game.schedule().cumulative_target(game.elapsed_ms()),
                live: game.live_count(),
            });
        }
    }

    tracing::debug!(
        windows = samples.len(),
        spawned = game.total_spawned(),
        "simulation finished"
    );
    SimulationReport {
        samples,
        final_state: game.state(),
        elapsed_ms: game.elapsed_ms(),
        total_spawned: game.total_spawned(),
        live: game.live_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: SpawnMode, add: Option<u32>, limit: u32) -> SimulationConfig {
        SimulationConfig {
            mode,
            interval_ms: 1000,
            add_per_interval: add,
            limit,
            end_on_limit: true,
            seed: 7,
            duration_ms: 5_900,
            frame_ms: 16.0,
        }
    }

    #[test]
    fn doubling_tracks_expected_totals() {
        let report = run(&config(SpawnMode::Doubling, None, 10_000));
        assert_eq!(report.final_state, RunState::Running);
        for sample in &report.samples {
            assert_eq!(sample.total_spawned, sample.expected, "window {}", sample.index);
        }
        assert_eq!(report.samples.last().map(|s| s.index), Some(5));
    }

    #[test]
    fn limit_ends_the_run() {
        let report = run(&config(SpawnMode::Linear, Some(4), 10));
        assert_eq!(report.final_state, RunState::Ended);
        assert_eq!(report.total_spawned, 12);
        assert!(report.live >= 10);
        assert!(report.render().contains("ended at"));
    }

    #[test]
    fn holding_at_the_limit_keeps_running() {
        let mut cfg = config(SpawnMode::Linear, Some(4), 10);
        cfg.end_on_limit = false;
        let report = run(&cfg);
        assert_eq!(report.final_state, RunState::Running);
        assert!(report.live <= 10);
    }
}
