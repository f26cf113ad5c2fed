//! Poll metrics collection module
//!
//! Records per-cycle metrics on the `metrics` facade and aggregates them in
//! memory for the end-of-session summary.

use contracts::AvatarState;
use metrics::{counter, gauge};

/// Record an applied state transition
///
/// Call from a state listener; the engine itself already records its
/// transport-level counters.
pub fn record_state_applied(state: &AvatarState) {
    counter!("maze_walker_listener_updates_total").increment(1);
    gauge!("maze_walker_avatar_x").set(state.position.x);
    gauge!("maze_walker_avatar_y").set(state.position.y);
    gauge!("maze_walker_avatar_direction_deg").set(state.direction);
}

/// Poll metrics aggregator
///
/// Aggregates samples in memory for summary output; complementary to the
/// engine's own exponentially smoothed estimates, which favour recency.
#[derive(Debug, Clone, Default)]
pub struct PollMetricsAggregator {
    /// Applied state transitions
    pub states_applied: u64,

    /// Network delay statistics (ms)
    pub delay_stats: RunningStats,

    /// Gap between applied updates (ms)
    pub interval_stats: RunningStats,

    /// Total travelled distance, maze units
    pub distance_travelled: f64,

    last_position: Option<(f64, f64)>,
    last_applied_at: Option<std::time::Instant>,
}

impl PollMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one applied state transition.
    ///
    /// Also samples the wall-clock gap since the previous applied transition
    /// into the interval statistics.
    pub fn record_applied(&mut self, state: &AvatarState) {
        self.states_applied += 1;
        if let Some((x, y)) = self.last_position {
            let dx = state.position.x - x;
            let dy = state.position.y - y;
            self.distance_travelled += (dx * dx + dy * dy).sqrt();
        }
        self.last_position = Some((state.position.x, state.position.y));

        let now = std::time::Instant::now();
        if let Some(previous) = self.last_applied_at {
            self.interval_stats
                .push(now.duration_since(previous).as_secs_f64() * 1000.0);
        }
        self.last_applied_at = Some(now);
    }

    /// Fold in one measured network delay sample (ms)
    pub fn record_delay_ms(&mut self, delay_ms: f64) {
        self.delay_stats.push(delay_ms);
    }

    /// Fold in one applied-update gap sample (ms)
    pub fn record_interval_ms(&mut self, interval_ms: f64) {
        self.interval_stats.push(interval_ms);
    }

    /// Produce a summary report
    pub fn summary(&self) -> PollSummary {
        PollSummary {
            states_applied: self.states_applied,
            distance_travelled: self.distance_travelled,
            network_delay_ms: StatsSummary::from(&self.delay_stats),
            update_interval_ms: StatsSummary::from(&self.interval_stats),
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Poll summary
#[derive(Debug, Clone, Default)]
pub struct PollSummary {
    pub states_applied: u64,
    pub distance_travelled: f64,
    pub network_delay_ms: StatsSummary,
    pub update_interval_ms: StatsSummary,
}

impl std::fmt::Display for PollSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Poll Session Summary ===")?;
        writeln!(f, "States applied: {}", self.states_applied)?;
        writeln!(
            f,
            "Distance travelled: {:.2} maze units",
            self.distance_travelled
        )?;
        writeln!(f, "Network delay (ms): {}", self.network_delay_ms)?;
        writeln!(f, "Update interval (ms): {}", self.update_interval_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
