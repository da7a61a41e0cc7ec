mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use mock_service::Behavior;
    use std::num::NonZeroU32;
    use std::time::Duration;
    use surge::sync_nonces;
    use surge_core::{Scenario, StopReason};

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn rotation_ends_run_without_error() {
        let (handle, rpc) = endpoint(Behavior::StrictNonces { initial: 0 }).await;
        let config = load(Scenario::TransferToSelf, 4, 50, Duration::from_secs(60));
        let mut roles = roles(Scenario::TransferToSelf, 10);

        let stats = surge::run(&config, &mut roles, rpc).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::PoolExhausted);
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.succeeded, 8);
        assert_eq!(stats.outcomes.failed(), 0);
        assert_eq!(handle.state.received(), 8);
        assert!(stats.actual_tpu <= 4.0 + 1e-9);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn insufficient_funds_are_counted() {
        let (handle, rpc) = endpoint(Behavior::InsufficientFunds).await;
        let config = load(Scenario::TransferToKnown, 5, 20, Duration::from_secs(60));
        let mut roles = roles(Scenario::TransferToKnown, 20);

        let stats = surge::run(&config, &mut roles, rpc).await.unwrap();

        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.outcomes.insufficient_funds, 10);
        assert_eq!(handle.state.accepted(), 0);
        assert!(roles.senders.nonces().iter().all(|nonce| *nonce == 0));
        assert_eq!(stats.actual_tpu, 0.);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn nonces_stay_in_step_across_runs() {
        let (handle, rpc) = endpoint(Behavior::StrictNonces { initial: 0 }).await;
        let config = load(Scenario::TransferToRandom, 3, 20, Duration::from_secs(60));
        let mut roles = roles(Scenario::TransferToRandom, 6);

        for _ in 0..3 {
            let stats = surge::run(&config, &mut roles, rpc.clone()).await.unwrap();
            assert_eq!(stats.stop_reason, StopReason::PoolExhausted);
            assert_eq!(stats.outcomes.nonce_conflict, 0);
        }

        assert_eq!(roles.senders.nonces(), vec![3; 6]);
        for identity in roles.senders.iter() {
            assert_eq!(handle.state.expected_nonce(identity.address()), 3);
        }
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn stale_nonces_conflict_until_synced() {
        let (_handle, rpc) = endpoint(Behavior::StrictNonces { initial: 5 }).await;
        let config = load(Scenario::TransferToSelf, 2, 20, Duration::from_secs(60));

        let mut stale = roles(Scenario::TransferToSelf, 4);
        let stats = surge::run(&config, &mut stale, rpc.clone()).await.unwrap();
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.outcomes.nonce_conflict, 4);
        assert_eq!(stale.senders.nonces(), vec![0; 4]);

        let mut synced = roles(Scenario::TransferToSelf, 4);
        sync_nonces(&mut synced.senders, rpc.as_ref()).await.unwrap();
        assert_eq!(synced.senders.nonces(), vec![5; 4]);

        let stats = surge::run(&config, &mut synced, rpc).await.unwrap();
        assert_eq!(stats.succeeded, 4);
        assert_eq!(synced.senders.nonces(), vec![6; 4]);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn deadline_stops_run() {
        let (handle, rpc) = endpoint(Behavior::Accept).await;
        let config = load(Scenario::TransferToRandom, 5, 20, Duration::from_millis(100));
        let mut roles = roles(Scenario::TransferToRandom, 500);

        let stats = surge::run(&config, &mut roles, rpc).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::Deadline);
        assert!(stats.ticks >= 4, "ticks: {}", stats.ticks);
        assert_eq!(handle.state.received(), stats.ticks * 5);
        assert!(stats.actual_tpu <= 5.0 + 1e-9);
        assert!(stats.latency_p99 > Duration::ZERO);
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn slow_endpoint_lowers_achieved_rate() {
        let (_handle, rpc) = endpoint(Behavior::Limited {
            max_tps: NonZeroU32::new(20).unwrap(),
            delay_ms: 5,
        })
        .await;
        let config = load(Scenario::TransferToSelf, 10, 100, Duration::from_secs(60));
        let mut roles = roles(Scenario::TransferToSelf, 40);

        let stats = surge::run(&config, &mut roles, rpc).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::PoolExhausted);
        assert_eq!(stats.succeeded, 40);
        assert!(stats.time_spent_sending > Duration::from_millis(400));
        assert!(dbg!(stats.actual_tpu) < 10.0);
    }
}
