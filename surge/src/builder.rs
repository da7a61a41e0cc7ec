//! Parallel construction of signed transfers.
use crate::account::IdentityPool;
use crate::window::Window;
use alloy_consensus::{SignableTransaction as _, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes as TxInput, Signature, TxKind, B256, U256};
use bytes::Bytes;
use futures::future::join_all;
use k256::ecdsa::SigningKey;
use serde_json::json;
use sha3::{Digest as _, Keccak256};
use surge_core::{JsonRpcRequest, LoadConfig, SurgeError};
#[allow(unused)]
use tracing::{debug, trace};

/// Chain parameters shared by every transfer of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub chain_id: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub value: U256,
}

impl From<&LoadConfig> for TransferParams {
    fn from(config: &LoadConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            gas_limit: config.gas_limit,
            gas_price: config.gas_price as u128,
            value: U256::from(config.sending_amount),
        }
    }
}

/// One signed transfer ready to go on the wire.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Index of the sender in the pool.
    pub sender: usize,
    /// Complete `eth_sendRawTransaction` request body.
    pub payload: Bytes,
    pub content_id: B256,
}

pub(crate) struct SignedTransfer {
    pub raw: Vec<u8>,
    pub hash: B256,
}

pub(crate) fn sign_transfer(
    key: &SigningKey,
    nonce: u64,
    to: Address,
    params: TransferParams,
) -> Result<SignedTransfer, k256::ecdsa::Error> {
    let tx = TxLegacy {
        chain_id: Some(params.chain_id),
        nonce,
        gas_price: params.gas_price,
        gas_limit: params.gas_limit,
        to: TxKind::Call(to),
        value: params.value,
        input: TxInput::new(),
    };

    let digest = Keccak256::new_with_prefix(tx.encoded_for_signing());
    let (sig, recid) = key.sign_digest_recoverable(digest)?;
    let signed = tx.into_signed(Signature::from((sig, recid)));
    let hash = *signed.hash();

    let mut raw = Vec::new();
    TxEnvelope::from(signed).encode_2718(&mut raw);
    Ok(SignedTransfer { raw, hash })
}

/// JSON-RPC body submitting `raw` through `eth_sendRawTransaction`.
pub fn request_body(raw: &[u8]) -> Bytes {
    let request = JsonRpcRequest::new(
        "eth_sendRawTransaction",
        json!([format!("0x{}", hex::encode(raw))]),
    );
    // Serializing a struct of strings and JSON values cannot fail.
    Bytes::from(serde_json::to_vec(&request).unwrap_or_default())
}

/// Sign one transfer per sender/receiver pair, all pairs in parallel.
///
/// The output is ordered like `sender_window`. Nonces are read, never written.
pub async fn build_batch(
    senders: &IdentityPool,
    receivers: &IdentityPool,
    sender_window: &Window,
    receiver_window: &Window,
    params: TransferParams,
) -> Result<Vec<Submission>, SurgeError> {
    let jobs = sender_window
        .iter()
        .zip(receiver_window.iter())
        .map(|(sender_idx, receiver_idx)| {
            let sender = senders.get(sender_idx);
            let key = sender.and_then(|s| s.key()).cloned();
            let nonce = sender.map(|s| s.nonce()).unwrap_or_default();
            let to = receivers.get(receiver_idx).map(|r| r.address());

            async move {
                let (key, to) = match (key, to) {
                    (Some(key), Some(to)) => (key, to),
                    _ => {
                        return Err(SurgeError::Signing {
                            index: sender_idx,
                            message: "sender has no signing key or receiver is missing".into(),
                        })
                    }
                };

                let signed = tokio::task::spawn_blocking(move || {
                    sign_transfer(&key, nonce, to, params)
                })
                .await
                .map_err(|e| SurgeError::Task(e.to_string()))?
                .map_err(|e| SurgeError::Signing {
                    index: sender_idx,
                    message: e.to_string(),
                })?;

                trace!("signed transfer {} from #{sender_idx} nonce {nonce}", signed.hash);
                Ok(Submission {
                    sender: sender_idx,
                    payload: request_body(&signed.raw),
                    content_id: signed.hash,
                })
            }
        });

    join_all(jobs).await.into_iter().collect()
}
