use mock_service::{Behavior, MockHandle};
use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use surge::{HttpRpcClient, IdentityPool, Roles};
use surge_core::{LoadConfig, Scenario};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("surge=debug,mock_service=info"))
            .with_test_writer()
            .try_init();
    });
}

#[allow(unused)]
pub async fn endpoint(behavior: Behavior) -> (MockHandle, Arc<HttpRpcClient>) {
    init();
    let handle = mock_service::spawn(behavior).await.unwrap();
    let client = Arc::new(HttpRpcClient::new(handle.url()).unwrap());
    (handle, client)
}

#[allow(unused)]
pub fn load(scenario: Scenario, tpu: u32, unit_ms: u64, duration: Duration) -> LoadConfig {
    LoadConfig::default()
        .scenario(scenario)
        .tpu(NonZeroU32::new(tpu).unwrap())
        .time_unit(Duration::from_millis(unit_ms))
        .duration(duration)
        .warmup(Duration::ZERO)
}

#[allow(unused)]
pub fn roles(scenario: Scenario, identities: usize) -> Roles {
    Roles::prepare(scenario, IdentityPool::generate(identities)).unwrap()
}
