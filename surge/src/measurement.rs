//! Per-run accumulation of tick outcomes, time spent and submission latency.
use crate::dispatch::DispatchReport;
use std::time::Duration;
use surge_core::{achieved_rate, LatencyDigest, LoadConfig, OutcomeCounts, RunStatistics, StopReason};

/// Accumulated across ticks, read once when the run stops.
#[derive(Debug, Default)]
pub struct RunMetrics {
    pub ticks: u64,
    pub time_spent_sending: Duration,
    pub outcomes: OutcomeCounts,
    latency: LatencyDigest,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one tick, accounted for `effective` wall time.
    pub fn record_tick(&mut self, report: &DispatchReport, effective: Duration) {
        self.ticks += 1;
        self.time_spent_sending += effective;
        self.outcomes += report.counts;
        self.latency.extend(&report.latencies);
    }

    pub fn succeeded(&self) -> u64 {
        self.outcomes.success
    }

    pub fn finish(
        self,
        config: &LoadConfig,
        distinct_senders: usize,
        stop_reason: StopReason,
    ) -> RunStatistics {
        RunStatistics {
            scenario: config.scenario,
            ticks: self.ticks,
            goal_tpu: config.tpu,
            time_unit: config.time_unit,
            succeeded: self.outcomes.success,
            outcomes: self.outcomes,
            time_spent_sending: self.time_spent_sending,
            actual_tpu: achieved_rate(
                self.outcomes.success,
                self.time_spent_sending,
                config.time_unit,
            ),
            distinct_senders,
            latency_p50: self.latency.quantile(0.5),
            latency_p90: self.latency.quantile(0.9),
            latency_p99: self.latency.quantile(0.99),
            stop_reason,
        }
    }
}
