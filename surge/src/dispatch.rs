//! Concurrent fan-out of a batch against the endpoint.
use crate::builder::Submission;
use crate::client::EthRpc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use surge_core::{Outcome, OutcomeCounts, SurgeError};
use tokio::task::JoinSet;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Per-submission results of one dispatch phase, indexed like the input batch.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<Outcome>,
    pub latencies: Vec<Duration>,
    pub counts: OutcomeCounts,
}

impl DispatchReport {
    pub fn failures(&self) -> u64 {
        self.counts.failed()
    }
}

pub struct Dispatcher {
    rpc: Arc<dyn EthRpc>,
}

impl Dispatcher {
    pub fn new(rpc: Arc<dyn EthRpc>) -> Self {
        Self { rpc }
    }

    /// Fire every submission at once and wait for all of them. Nothing is retried.
    ///
    /// `on_success` runs once per successful submission, on the collecting task, so it has
    /// exclusive access to whatever it captures. Network calls never run inside it.
    pub async fn dispatch<F>(
        &self,
        submissions: &[Submission],
        mut on_success: F,
    ) -> Result<DispatchReport, SurgeError>
    where
        F: FnMut(&Submission),
    {
        let mut set = JoinSet::new();
        for (slot, submission) in submissions.iter().enumerate() {
            let rpc = self.rpc.clone();
            let payload = submission.payload.clone();
            set.spawn(async move {
                let start = Instant::now();
                let outcome = rpc.submit_signed_transaction(payload).await;
                (slot, outcome, start.elapsed())
            });
        }

        let mut outcomes: Vec<Option<Outcome>> = vec![None; submissions.len()];
        let mut latencies = vec![Duration::ZERO; submissions.len()];
        let mut counts = OutcomeCounts::default();

        while let Some(res) = set.join_next().await {
            let (slot, outcome, latency) = res.map_err(|e| SurgeError::Task(e.to_string()))?;
            let submission = &submissions[slot];

            record_metrics(&outcome, latency);
            counts.record(&outcome);
            match &outcome {
                Outcome::Success => on_success(submission),
                Outcome::NonceConflict { expected, message } => {
                    warn!(
                        "Nonce conflict for sender #{} ({}), endpoint expected {expected}: {message}",
                        submission.sender, submission.content_id
                    );
                }
                failure => {
                    warn!(
                        "Submission {} from sender #{} failed: {failure}",
                        submission.content_id, submission.sender
                    );
                }
            }

            outcomes[slot] = Some(outcome);
            latencies[slot] = latency;
        }

        let outcomes = outcomes
            .into_iter()
            .map(|o| o.ok_or_else(|| SurgeError::Task("dispatch task vanished".into())))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Dispatched {} submissions, {} failed",
            submissions.len(),
            counts.failed()
        );
        Ok(DispatchReport {
            outcomes,
            latencies,
            counts,
        })
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(outcome: &Outcome, latency: Duration) {
    metrics::histogram!("surge_submission_latency").record(latency.as_nanos() as f64);
    let name = match outcome {
        Outcome::Success => "surge_submissions_success",
        Outcome::InsufficientFunds { .. } => "surge_submissions_insufficient_funds",
        Outcome::NonceConflict { .. } => "surge_submissions_nonce_conflict",
        Outcome::TransportError { .. } => "surge_submissions_transport_error",
    };
    metrics::counter!(name).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_outcome: &Outcome, _latency: Duration) {}
