use mock_service::Behavior;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("MOCK_RPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8545".to_string())
        .parse()?;
    let behavior = match std::env::var("MOCK_RPC_STRICT_NONCES") {
        Ok(_) => Behavior::StrictNonces { initial: 0 },
        Err(_) => Behavior::Accept,
    };

    mock_service::run(addr, behavior).await
}
