use crate::config::Scenario;
use crate::data::OutcomeCounts;
use crate::error::InvariantViolation;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// Why the run loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Wall clock reached `start + duration`.
    Deadline,
    /// The sender rotation wrapped around, so every sender has been used once.
    PoolExhausted,
    Violation(InvariantViolation),
}

impl StopReason {
    pub fn is_violation(&self) -> bool {
        matches!(self, StopReason::Violation(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Deadline => write!(f, "deadline reached"),
            StopReason::PoolExhausted => write!(f, "sender pool exhausted"),
            StopReason::Violation(violation) => write!(f, "{violation}"),
        }
    }
}

/// Final report of a load run.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub scenario: Scenario,
    pub ticks: u64,
    pub goal_tpu: NonZeroU32,
    pub time_unit: Duration,
    /// Successful submissions, equal to the number of distinct content identifiers seen.
    pub succeeded: u64,
    pub outcomes: OutcomeCounts,
    pub time_spent_sending: Duration,
    /// Successes per `time_unit` over `time_spent_sending`.
    pub actual_tpu: f64,
    pub distinct_senders: usize,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
    pub stop_reason: StopReason,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scenario={}, ticks={}, numTotalSent={}, failed={} (insufficientFunds={}, nonceConflict={}, transport={}), timeSpent={}, timeUnit={}, targetTpu={}, realTpu={:.2}, p50={:?}, p90={:?}, p99={:?}, stop={}",
            self.scenario,
            self.ticks,
            self.succeeded,
            self.outcomes.failed(),
            self.outcomes.insufficient_funds,
            self.outcomes.nonce_conflict,
            self.outcomes.transport_error,
            humantime::format_duration(self.time_spent_sending),
            humantime::format_duration(self.time_unit),
            self.goal_tpu,
            self.actual_tpu,
            self.latency_p50,
            self.latency_p90,
            self.latency_p99,
            self.stop_reason,
        )
    }
}

/// Successes per `time_unit`, measured over `time_spent`.
pub fn achieved_rate(succeeded: u64, time_spent: Duration, time_unit: Duration) -> f64 {
    if time_spent.is_zero() {
        return 0.;
    }
    succeeded as f64 * time_unit.as_secs_f64() / time_spent.as_secs_f64()
}
