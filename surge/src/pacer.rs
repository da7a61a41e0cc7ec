//! Per-tick cadence.
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, trace, warn};

/// Holds each tick to at least one time unit. Ticks never catch up on earlier overruns.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    unit: Duration,
}

impl Pacer {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Time left in the unit after `elapsed`, never negative.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.unit.saturating_sub(elapsed)
    }

    /// Sleep out the rest of the unit and return the duration the tick is accounted for:
    /// the unit itself, or `elapsed` when the work overran it.
    pub async fn pace(&self, elapsed: Duration) -> Duration {
        let remaining = self.remaining(elapsed);
        if remaining.is_zero() {
            warn!(
                "Tick took {} which is over the {} time unit",
                humantime::format_duration(elapsed),
                humantime::format_duration(self.unit)
            );
            return elapsed;
        }

        trace!("Sleeping {}", humantime::format_duration(remaining));
        tokio::time::sleep(remaining).await;
        self.unit
    }
}
