//! Session statistics and metrics.

use std::time::Duration;

use observability::PollMetricsAggregator;
use state_sync::EngineStats;

/// Statistics from a polling session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Session id issued by the server
    pub user_id: String,

    /// Total applied state updates
    pub updates_applied: u64,

    /// Whether the companion was met
    pub companion_met: bool,

    /// Total duration of the session
    pub duration: Duration,

    /// Engine health snapshot taken at shutdown
    pub engine: Option<EngineStats>,

    /// Poll metrics aggregator
    pub poll_metrics: PollMetricsAggregator,
}

impl SessionStats {
    /// Calculate applied updates per second
    pub fn updates_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.updates_applied as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Session Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Session id: {}", self.user_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Updates applied: {}", self.updates_applied);
        println!("   ├─ Updates/s: {:.2}", self.updates_per_second());
        println!(
            "   └─ Companion met: {}",
            if self.companion_met { "yes" } else { "no" }
        );

        if let Some(engine) = &self.engine {
            println!("\n📈 Engine Health");
            println!(
                "   ├─ Effective poll rate: {:.2} req/s",
                engine.average_request_per_second
            );
            println!("   ├─ Failed polls: {}", engine.failed_polls);
            println!("   ├─ Stale results dropped: {}", engine.stale_drops);
            match engine.average_network_delay_ms {
                Some(delay) => println!("   └─ Avg network delay: {delay:.2} ms"),
                None => println!("   └─ Avg network delay: N/A"),
            }
        }

        let summary = self.poll_metrics.summary();
        println!("\n🧭 Poll Metrics");
        println!(
            "   ├─ Distance travelled: {:.2} maze units",
            summary.distance_travelled
        );
        println!("   └─ Update interval (ms): {}", summary.update_interval_ms);

        println!();
    }
}
