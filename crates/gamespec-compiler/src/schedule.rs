//! Timed spawn schedule
//!
//! The schedule is a pure function of elapsed running time. Time is cut into
//! windows of `interval_ms`; each window has a target count that the runtime
//! catches up to, at most [`CATCH_UP_CAP`] objects per frame.

use gamespec_model::{SpawnMode, SpawnRule};

/// Maximum objects spawned in a single frame
pub const CATCH_UP_CAP: u64 = 50;

/// Spawn schedule for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSchedule {
    mode: SpawnMode,
    interval_ms: u64,
    add_per_interval: u64,
}

impl SpawnSchedule {
    /// Build from a spawn rule; a zero interval is raised to 1 ms
    #[must_use]
    pub fn new(rule: &SpawnRule) -> Self {
        Self {
            mode: rule.mode,
            interval_ms: rule.interval_ms.max(1),
            add_per_interval: u64::from(rule.add_per_interval.unwrap_or(0)),
        }
    }

    /// Window length in milliseconds
    #[inline]
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Spawn mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Active window index: `floor(elapsed / interval)`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn window_index(&self, elapsed_ms: f64) -> u64 {
        if elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
            return 0;
        }
        (elapsed_ms / self.interval_ms as f64).floor() as u64
    }

    /// Objects to spawn within window `index`
    ///
    /// Doubling yields `2^index`, saturating at `u64::MAX`.
    #[must_use]
    pub fn window_target(&self, index: u64) -> u64 {
        if self.mode.is_per_interval() {
            self.add_per_interval
        } else {
            u32::try_from(index)
                .ok()
                .and_then(|shift| 1u64.checked_shl(shift))
                .unwrap_or(u64::MAX)
        }
    }

    /// Total objects the schedule has asked for by `elapsed_ms`
    ///
    /// For doubling this is `sum_{k=0}^{floor(t/I)} 2^k`.
    #[must_use]
    pub fn cumulative_target(&self, elapsed_ms: f64) -> u64 {
        let last = self.window_index(elapsed_ms);
        if self.mode.is_per_interval() {
            return self.add_per_interval.saturating_mul(last.saturating_add(1));
        }
        // 2^(last+1) - 1
        u32::try_from(last.saturating_add(1))
            .ok()
            .and_then(|shift| 1u64.checked_shl(shift))
            .map_or(u64::MAX, |v| v - 1)
    }

    /// Objects to spawn this frame given how many the window already produced
    #[must_use]
    pub fn frame_quota(&self, index: u64, spawned_in_window: u64) -> u64 {
        self.window_target(index)
            .saturating_sub(spawned_in_window)
            .min(CATCH_UP_CAP)
    }

    /// HUD rate label for a window, e.g. `4/2s` or `+3/2s`
    #[must_use]
    pub fn rate_label(&self, index: u64) -> String {
        #[allow(clippy::cast_precision_loss)]
        let secs = self.interval_ms as f64 / 1000.0;
        if self.mode.is_per_interval() {
            format!("+{}/{secs}s", self.add_per_interval)
        } else {
            format!("{}/{secs}s", self.window_target(index))
        }
    }
}

impl Default for SpawnSchedule {
    fn default() -> Self {
        Self::new(&SpawnRule::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn doubling_targets() {
        let s = SpawnSchedule::default();
        assert_eq!(s.window_index(0.0), 0);
        assert_eq!(s.window_index(1999.0), 0);
        assert_eq!(s.window_index(2000.0), 1);
        assert_eq!(s.window_target(0), 1);
        assert_eq!(s.window_target(3), 8);
        assert_eq!(s.window_target(64), u64::MAX);
        assert_eq!(s.cumulative_target(4500.0), 1 + 2 + 4);
    }

    #[test]
    fn linear_targets() {
        let s = SpawnSchedule::new(&SpawnRule::linear(3, 2000));
        assert_eq!(s.window_target(0), 3);
        assert_eq!(s.window_target(9), 3);
        assert_eq!(s.cumulative_target(6100.0), 12);
        assert_eq!(s.rate_label(5), "+3/2s");
    }

    #[test]
    fn quota_is_capped() {
        let s = SpawnSchedule::new(&SpawnRule::linear(120, 1000));
        assert_eq!(s.frame_quota(0, 0), CATCH_UP_CAP);
        assert_eq!(s.frame_quota(0, 100), 20);
        assert_eq!(s.frame_quota(0, 130), 0);
    }

    #[test]
    fn rate_label_formats_fractional_seconds() {
        let s = SpawnSchedule::new(&SpawnRule::doubling(1500));
        assert_eq!(s.rate_label(2), "4/1.5s");
    }

    #[test]
    fn zero_interval_is_raised() {
        let s = SpawnSchedule::new(&SpawnRule::doubling(0));
        assert_eq!(s.interval_ms(), 1);
        assert_eq!(s.window_index(f64::NAN), 0);
    }

    proptest! {
        #[test]
        fn prop_doubling_cumulative_matches_sum(
            interval in 1u64..10_000,
            window in 0u64..60,
            offset in 0.0f64..1.0,
        ) {
            let s = SpawnSchedule::new(&SpawnRule::doubling(interval));
            #[allow(clippy::cast_precision_loss)]
            let t = (window as f64 + offset * 0.99) * interval as f64;
            prop_assert_eq!(s.window_index(t), window);
            let sum: u64 = (0..=window).map(|k| 1u64 << k).sum();
            prop_assert_eq!(s.cumulative_target(t), sum);
        }
    }
}
