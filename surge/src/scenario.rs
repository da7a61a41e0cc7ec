//! The run loop.
use crate::account::Roles;
use crate::builder::{build_batch, TransferParams};
use crate::client::EthRpc;
use crate::dispatch::Dispatcher;
use crate::guard::SanityGuard;
use crate::measurement::RunMetrics;
use crate::pacer::Pacer;
use crate::window;
use std::sync::Arc;
use surge_core::{LoadConfig, RunStatistics, StopReason, SurgeError};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Drive ticks until the deadline, the end of the sender rotation, or an invariant violation.
///
/// Per-submission failures never end the run. A violation is reported through
/// [`RunStatistics::stop_reason`] so the caller still gets the partial report.
#[instrument(name = "run", skip_all, fields(scenario = %config.scenario))]
pub async fn run(
    config: &LoadConfig,
    roles: &mut Roles,
    rpc: Arc<dyn EthRpc>,
) -> Result<RunStatistics, SurgeError> {
    let unit = config.unit_size();
    window::validate(unit, roles.senders.len())?;
    window::validate(unit, roles.receivers.len())?;

    let params = TransferParams::from(config);
    let dispatcher = Dispatcher::new(rpc);
    let pacer = Pacer::new(config.time_unit);
    let mut guard = SanityGuard::new();
    let mut metrics = RunMetrics::new();

    info!(
        "Sending {unit} transfers every {} for {} from {} senders",
        humantime::format_duration(config.time_unit),
        humantime::format_duration(config.duration),
        roles.senders.len()
    );

    let deadline = Instant::now() + config.duration;
    let mut tick = 0u64;
    let stop_reason = loop {
        let start = window::start_offset(tick, unit, roles.senders.len());
        let sender_window = window::select(roles.senders.len(), unit, start)?;
        let receiver_window = window::select(roles.receivers.len(), unit, start)?;

        if let Some(stop) = guard.check_senders(tick, &roles.senders, &sender_window) {
            break stop;
        }

        let tick_start = Instant::now();
        let batch = build_batch(
            &roles.senders,
            &roles.receivers,
            &sender_window,
            &receiver_window,
            params,
        )
        .await?;

        let mut accepted = Vec::with_capacity(batch.len());
        let senders = &mut roles.senders;
        let report = dispatcher
            .dispatch(&batch, |submission| {
                senders.increase_nonce(submission.sender);
                accepted.push(submission.content_id);
            })
            .await?;

        let effective = pacer.pace(tick_start.elapsed()).await;
        metrics.record_tick(&report, effective);
        debug!(
            "Tick {tick}: {} of {} accepted in {}",
            report.counts.success,
            batch.len(),
            humantime::format_duration(effective)
        );

        if let Some(stop) = guard.check_content_ids(tick, &accepted) {
            break stop;
        }

        tick += 1;
        if Instant::now() >= deadline {
            break StopReason::Deadline;
        }
    };

    if metrics.outcomes.nonce_conflict > 0 {
        warn!(
            "{} submissions hit a nonce conflict, local nonces are out of sync with the endpoint",
            metrics.outcomes.nonce_conflict
        );
    }

    let stats = metrics.finish(config, guard.distinct_senders(), stop_reason);
    if stats.stop_reason.is_violation() {
        error!("Run halted: {stats}");
    } else {
        info!("Run finished: {stats}");
    }
    Ok(stats)
}
