use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::ops::AddAssign;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Result of a single submission. Produced once and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    InsufficientFunds { message: String },
    NonceConflict { expected: u64, message: String },
    TransportError { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::InsufficientFunds { message } => write!(f, "insufficient funds: {message}"),
            Outcome::NonceConflict { expected, message } => {
                write!(f, "nonce conflict (expected {expected}): {message}")
            }
            Outcome::TransportError { message } => write!(f, "transport error: {message}"),
        }
    }
}

/// Per-kind tally of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub success: u64,
    pub insufficient_funds: u64,
    pub nonce_conflict: u64,
    pub transport_error: u64,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::InsufficientFunds { .. } => self.insufficient_funds += 1,
            Outcome::NonceConflict { .. } => self.nonce_conflict += 1,
            Outcome::TransportError { .. } => self.transport_error += 1,
        }
    }

    pub fn failed(&self) -> u64 {
        self.insufficient_funds + self.nonce_conflict + self.transport_error
    }

    pub fn total(&self) -> u64 {
        self.success + self.failed()
    }
}

impl AddAssign for OutcomeCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.success += rhs.success;
        self.insufficient_funds += rhs.insufficient_funds;
        self.nonce_conflict += rhs.nonce_conflict;
        self.transport_error += rhs.transport_error;
    }
}

impl<'a> FromIterator<&'a Outcome> for OutcomeCounts {
    fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
        let mut counts = Self::default();
        for outcome in iter {
            counts.record(outcome);
        }
        counts
    }
}

/// Cumulative submission latency. Probabilistic, so quantiles are estimates.
#[derive(Debug, Clone)]
pub struct LatencyDigest {
    digest: TDigest<K1>,
    count: u64,
}

impl Default for LatencyDigest {
    fn default() -> Self {
        Self {
            digest: default_tdigest(),
            count: 0,
        }
    }
}

impl LatencyDigest {
    pub fn push(&mut self, latency: Duration) {
        self.digest.insert(latency.as_secs_f64());
        self.count += 1;
    }

    pub fn extend(&mut self, latencies: &[Duration]) {
        for latency in latencies {
            self.push(*latency);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn quantile(&self, quantile: f64) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }

        let secs = self.digest.quantile(quantile);

        // TDigest occasionally hands back NaN for sparse inputs.
        let secs = if secs.is_finite() && secs >= 0. {
            secs
        } else {
            error!("Non-finite latency quantile {quantile}; reporting zero.");
            0.
        };

        Duration::from_secs_f64(secs)
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let outcomes = [
            Outcome::Success,
            Outcome::Success,
            Outcome::InsufficientFunds {
                message: "broke".to_string(),
            },
            Outcome::NonceConflict {
                expected: 3,
                message: "expected 3".to_string(),
            },
            Outcome::TransportError {
                message: "connection refused".to_string(),
            },
        ];
        let counts: OutcomeCounts = outcomes.iter().collect();
        assert_eq!(counts.success, 2);
        assert_eq!(counts.failed(), 3);
        assert_eq!(counts.total(), 5);

        let mut sum = counts;
        sum += counts;
        assert_eq!(sum.nonce_conflict, 2);
        assert_eq!(sum.total(), 10);
    }

    #[test]
    fn empty_digest_reports_zero() {
        let digest = LatencyDigest::default();
        assert_eq!(digest.quantile(0.5), Duration::ZERO);
    }

    #[test]
    fn digest_quantiles_are_ordered() {
        let mut digest = LatencyDigest::default();
        for ms in 1..=100 {
            digest.push(Duration::from_millis(ms));
        }
        assert_eq!(digest.count(), 100);
        let p50 = digest.quantile(0.5);
        let p99 = digest.quantile(0.99);
        assert!(p50 > Duration::from_millis(30) && p50 < Duration::from_millis(70));
        assert!(p99 >= p50);
    }
}
