//! RPC client boundary and its HTTP implementation.
use crate::account::IdentityPool;
use crate::classify::classify;
use alloy_primitives::Address;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use surge_core::{JsonRpcRequest, JsonRpcResponse, Outcome, SurgeError};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3 * 60);
const MAX_IDLE_PER_HOST: usize = 10_000;

/// No response came back at all.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("endpoint returned error {code}: {message}")]
    Endpoint { code: i64, message: String },
}

/// A JSON-RPC endpoint accepting signed transactions.
#[async_trait]
pub trait EthRpc: Send + Sync + 'static {
    /// Post `body` and return the raw response body.
    async fn call(&self, body: Bytes) -> Result<String, TransportError>;

    async fn submit_signed_transaction(&self, body: Bytes) -> Outcome {
        match self.call(body).await {
            Ok(response) => classify(&response),
            Err(err) => Outcome::TransportError {
                message: err.to_string(),
            },
        }
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, RpcError> {
        let request = JsonRpcRequest::new(
            "eth_getTransactionCount",
            json!([address.to_string(), "pending"]),
        );
        let body = serde_json::to_vec(&request).map_err(|e| RpcError::Malformed(e.to_string()))?;
        let response = self.call(Bytes::from(body)).await?;
        let response: JsonRpcResponse =
            serde_json::from_str(&response).map_err(|e| RpcError::Malformed(e.to_string()))?;

        if let Some(err) = response.error {
            return Err(RpcError::Endpoint {
                code: err.code,
                message: err.message,
            });
        }

        let quantity = response
            .result
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| RpcError::Malformed("missing result".into()))?;
        parse_quantity(quantity)
    }
}

fn parse_quantity(quantity: &str) -> Result<u64, RpcError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Malformed(format!("`{quantity}` is not a hex quantity")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Malformed(format!("`{quantity}` is not a hex quantity: {e}")))
}

/// JSON-RPC over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: String,
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EthRpc for HttpRpcClient {
    async fn call(&self, body: Bytes) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        // Status codes are ignored, the body carries the verdict.
        let status = response.status();
        if !status.is_success() {
            trace!("endpoint answered {status}");
        }
        response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}

/// Overwrite every local nonce with the endpoint's pending count.
pub async fn sync_nonces(pool: &mut IdentityPool, rpc: &dyn EthRpc) -> Result<(), SurgeError> {
    let queries = pool.iter().map(|identity| {
        let address = identity.address();
        async move { (address, rpc.pending_nonce(address).await) }
    });
    let results = join_all(queries).await;

    for (idx, (address, result)) in results.into_iter().enumerate() {
        let nonce = result.map_err(|e| SurgeError::NonceQuery {
            address: address.to_string(),
            message: e.to_string(),
        })?;
        pool.set_nonce(idx, nonce);
    }
    info!("Synchronised {} nonces with the endpoint", pool.len());
    Ok(())
}
