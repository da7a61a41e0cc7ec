mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use mock_service::Behavior;
    use std::time::Duration;
    use surge::IdentityPool;
    use surge_core::{Config, Scenario, StopReason};
    use surge_runtime::keystore::KeyStore;
    use surge_runtime::runtime::run_load;
    use surge_runtime::RuntimeError;

    fn config(keys: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.load = load(Scenario::TransferToKnown, 5, 20, Duration::from_secs(60));
        config.keystore.path = Some(keys.to_path_buf());
        config
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn run_from_key_store() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("pks.json");
        KeyStore::new(&keys).write(&IdentityPool::generate(20)).unwrap();
        let (handle, rpc) = endpoint(Behavior::StrictNonces { initial: 0 }).await;

        let stats = run_load(&config(&keys), rpc).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::PoolExhausted);
        assert_eq!(stats.succeeded, 10);
        assert_eq!(handle.state.accepted(), 10);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn nodes_split_the_key_store() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("pks.json");
        KeyStore::new(&keys).write(&IdentityPool::generate(40)).unwrap();
        let (handle, rpc) = endpoint(Behavior::StrictNonces { initial: 0 }).await;

        let mut total = 0;
        for node_index in 0..2 {
            let mut config = config(&keys);
            config.load.node_count = 2;
            config.load.node_index = node_index;
            config.load.sync_nonces = true;
            let stats = run_load(&config, rpc.clone()).await.unwrap();
            assert_eq!(stats.outcomes.nonce_conflict, 0);
            total += stats.succeeded;
        }

        assert_eq!(total, 20);
        assert_eq!(handle.state.accepted(), 20);
    }

    #[tokio::test]
    async fn missing_key_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (_handle, rpc) = endpoint(Behavior::Accept).await;
        let err = run_load(&config(&dir.path().join("absent.json")), rpc)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::KeyStore(_)));
    }

    #[tokio::test]
    async fn window_larger_than_senders_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("pks.json");
        KeyStore::new(&keys).write(&IdentityPool::generate(8)).unwrap();
        let (_handle, rpc) = endpoint(Behavior::Accept).await;

        let err = run_load(&config(&keys), rpc).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Surge(_)));
    }
}
