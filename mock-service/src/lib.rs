//! JSON-RPC endpoint with scripted answers for `eth_sendRawTransaction` and
//! `eth_getTransactionCount`.
use alloy_consensus::transaction::SignerRecoverable;
use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::Address;
use axum::{debug_handler, extract::State, routing::post, Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use surge_core::{JsonRpcRequest, JsonRpcResponse};
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, info, warn};

const SERVER_ERROR: i64 = -32000;
const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Every transaction is accepted.
    Accept,
    /// Every transaction is rejected for lack of funds.
    InsufficientFunds,
    /// Transactions must carry the next nonce of their sender, starting at `initial`.
    StrictNonces { initial: u64 },
    /// Accept, but never faster than `max_tps` and after `delay_ms`.
    Limited { max_tps: NonZeroU32, delay_ms: u64 },
}

pub struct MockState {
    behavior: Behavior,
    limiter: Option<DefaultDirectRateLimiter>,
    received: AtomicU64,
    accepted: AtomicU64,
    nonces: Mutex<HashMap<Address, u64>>,
}

impl MockState {
    pub fn new(behavior: Behavior) -> Self {
        let limiter = match &behavior {
            Behavior::Limited { max_tps, .. } => Some(rate_limiter(*max_tps)),
            _ => None,
        };
        Self {
            behavior,
            limiter,
            received: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Submissions received so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    fn initial_nonce(&self) -> u64 {
        match self.behavior {
            Behavior::StrictNonces { initial } => initial,
            _ => 0,
        }
    }

    /// Next nonce the endpoint expects from `address`.
    pub fn expected_nonce(&self, address: Address) -> u64 {
        let initial = self.initial_nonce();
        self.nonces
            .lock()
            .map(|nonces| nonces.get(&address).copied().unwrap_or(initial))
            .unwrap_or(initial)
    }

    async fn send_raw_transaction(&self, id: Value, params: &Value) -> JsonRpcResponse {
        self.received.fetch_add(1, Ordering::Relaxed);
        counter!("mock_rpc_submissions").increment(1);

        let envelope = match decode_raw(params) {
            Ok(envelope) => envelope,
            Err(message) => return JsonRpcResponse::error(id, INVALID_PARAMS, message),
        };
        let hash = format!("{}", envelope.tx_hash());

        match &self.behavior {
            Behavior::Accept => {}
            Behavior::InsufficientFunds => {
                return JsonRpcResponse::error(
                    id,
                    SERVER_ERROR,
                    "sender balance < tx cost (0 < 40283448000000): insufficient funds",
                );
            }
            Behavior::StrictNonces { .. } => {
                if let Err(message) = self.take_nonce(&envelope) {
                    return JsonRpcResponse::error(id, SERVER_ERROR, message);
                }
            }
            Behavior::Limited { delay_ms, .. } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                if let Some(limiter) = &self.limiter {
                    limiter.until_ready().await;
                }
            }
        }

        self.accepted.fetch_add(1, Ordering::Relaxed);
        JsonRpcResponse::result(id, Value::String(hash))
    }

    fn take_nonce(&self, envelope: &TxEnvelope) -> Result<(), String> {
        let TxEnvelope::Legacy(signed) = envelope else {
            return Err("only legacy transactions are supported".to_string());
        };
        let sender = envelope
            .recover_signer()
            .map_err(|e| format!("invalid signature: {e}"))?;
        let got = signed.tx().nonce;

        let initial = self.initial_nonce();
        let mut nonces = self.nonces.lock().map_err(|_| "nonce table poisoned".to_string())?;
        let expected = nonces.get(&sender).copied().unwrap_or(initial);
        if got != expected {
            return Err(format!("invalid nonce; got {got}, expected {expected}"));
        }
        nonces.insert(sender, expected + 1);
        Ok(())
    }

    fn transaction_count(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let address = params
            .get(0)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Address>().ok());
        match address {
            Some(address) => {
                let nonce = self.expected_nonce(address);
                JsonRpcResponse::result(id, json!(format!("0x{nonce:x}")))
            }
            None => JsonRpcResponse::error(id, INVALID_PARAMS, "expected an address"),
        }
    }
}

fn decode_raw(params: &Value) -> Result<TxEnvelope, String> {
    let raw = params
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| "missing raw transaction".to_string())?;
    let bytes = hex::decode(raw.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    TxEnvelope::decode_2718(&mut bytes.as_slice()).map_err(|e| e.to_string())
}

#[debug_handler]
pub async fn rpc(
    State(state): State<Arc<MockState>>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    let id = request.id.clone();
    let response = match request.method.as_str() {
        "eth_sendRawTransaction" => state.send_raw_transaction(id, &request.params).await,
        "eth_getTransactionCount" => state.transaction_count(id, &request.params),
        other => {
            debug!("unsupported method {other}");
            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("the method {other} does not exist"))
        }
    };
    Json(response)
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", post(rpc))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: SocketAddr, behavior: Behavior) -> anyhow::Result<()> {
    let state = Arc::new(MockState::new(behavior));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("mock endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// A mock endpoint running on an ephemeral local port.
pub struct MockHandle {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

pub async fn spawn(behavior: Behavior) -> anyhow::Result<MockHandle> {
    let state = Arc::new(MockState::new(behavior));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!("mock endpoint stopped: {err}");
        }
    });
    Ok(MockHandle { addr, state })
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
