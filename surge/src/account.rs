//! Signing identities and the pool that owns their nonces.
use alloy_primitives::{keccak256, Address};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::collections::HashSet;
use std::fmt;
use surge_core::{ConfigError, Scenario};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("private key #{index} is not valid hex: {source}")]
    InvalidHex {
        index: usize,
        #[source]
        source: hex::FromHexError,
    },

    #[error("private key #{index} is not a valid secp256k1 scalar")]
    InvalidKey { index: usize },

    #[error("private key #{index} duplicates an earlier entry")]
    DuplicateKey { index: usize },
}

/// A signing key plus address plus locally tracked nonce.
///
/// Recipients of random transfers carry no key at all.
#[derive(Clone)]
pub struct Identity {
    key: Option<SigningKey>,
    address: Address,
    nonce: u64,
}

impl Identity {
    pub fn from_key(key: SigningKey) -> Self {
        let address = address_from_key(&key);
        Self {
            key: Some(key),
            address,
            nonce: 0,
        }
    }

    pub fn random() -> Self {
        Self::from_key(SigningKey::random(&mut OsRng))
    }

    pub fn address_only(address: Address) -> Self {
        Self {
            key: None,
            address,
            nonce: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn key(&self) -> Option<&SigningKey> {
        self.key.as_ref()
    }

    /// `0x`-prefixed hex of the private key, as written to the key store.
    pub fn secret_hex(&self) -> Option<String> {
        self.key
            .as_ref()
            .map(|key| format!("0x{}", hex::encode(key.to_bytes())))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .field("has_key", &self.key.is_some())
            .finish()
    }
}

pub fn address_from_key(key: &SigningKey) -> Address {
    let encoded = key.verifying_key().to_encoded_point(false);
    let pubkey = encoded.as_bytes();
    let hash = keccak256(&pubkey[1..]);
    Address::from_slice(&hash[12..])
}

/// Parse a hex private key, with or without the `0x` prefix.
pub fn parse_secret_key(raw: &str, index: usize) -> Result<SigningKey, KeyError> {
    let normalized = raw.trim().trim_start_matches("0x");
    let bytes =
        hex::decode(normalized).map_err(|source| KeyError::InvalidHex { index, source })?;
    SigningKey::from_slice(&bytes).map_err(|_| KeyError::InvalidKey { index })
}

/// Ordered collection of identities. The single mutable owner of every nonce.
#[derive(Debug, Clone, Default)]
pub struct IdentityPool {
    identities: Vec<Identity>,
}

impl IdentityPool {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Build a pool from hex private keys, rejecting duplicates.
    pub fn from_secret_keys<I, S>(keys: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut identities = vec![];
        for (index, raw) in keys.into_iter().enumerate() {
            let raw = raw.as_ref();
            let normalized = raw.trim().trim_start_matches("0x").to_ascii_lowercase();
            if !seen.insert(normalized) {
                return Err(KeyError::DuplicateKey { index });
            }
            identities.push(Identity::from_key(parse_secret_key(raw, index)?));
        }
        debug!("done loading {} identities", identities.len());
        Ok(Self { identities })
    }

    /// `n` fresh identities with signing keys.
    pub fn generate(n: usize) -> Self {
        Self {
            identities: (0..n).map(|_| Identity::random()).collect(),
        }
    }

    /// `n` fresh addresses whose key material is thrown away.
    pub fn synthesize_address_only(n: usize) -> Self {
        Self {
            identities: (0..n)
                .map(|_| Identity::address_only(Identity::random().address()))
                .collect(),
        }
    }

    /// The same addresses without keys or nonces.
    pub fn address_only_view(&self) -> Self {
        Self {
            identities: self
                .identities
                .iter()
                .map(|identity| Identity::address_only(identity.address()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Identity> {
        self.identities.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    pub fn nonces(&self) -> Vec<u64> {
        self.identities.iter().map(Identity::nonce).collect()
    }

    pub fn set_nonce(&mut self, index: usize, nonce: u64) {
        if let Some(identity) = self.identities.get_mut(index) {
            identity.nonce = nonce;
        }
    }

    /// Off-chain optimistic increment after a successful submission.
    pub(crate) fn increase_nonce(&mut self, index: usize) {
        if let Some(identity) = self.identities.get_mut(index) {
            identity.nonce += 1;
            trace!("nonce of {} is now {}", identity.address, identity.nonce);
        }
    }

    /// Slice of the pool this node drives when several machines share one key list.
    ///
    /// Node `i` of `n` takes `[i*L/n, (i+1)*L/n)`.
    pub fn partition_for_node(self, node_count: usize, node_index: usize) -> Result<Self, ConfigError> {
        if node_count == 0 || node_index >= node_count {
            return Err(ConfigError::NodePartition {
                index: node_index,
                count: node_count,
            });
        }
        if node_count == 1 {
            return Ok(self);
        }

        let len = self.identities.len();
        let start = node_index * len / node_count;
        let end = (node_index + 1) * len / node_count;
        debug!("node {node_index} will use identities from {start} to {end}");
        Ok(Self {
            identities: self.identities[start..end].to_vec(),
        })
    }
}

/// Senders and receivers for a run.
#[derive(Debug, Clone)]
pub struct Roles {
    pub senders: IdentityPool,
    pub receivers: IdentityPool,
}

impl Roles {
    /// Split the loaded pool according to the scenario.
    pub fn prepare(scenario: Scenario, pool: IdentityPool) -> Result<Self, ConfigError> {
        let not_enough = |found| ConfigError::NotEnoughIdentities { scenario, found };
        match scenario {
            Scenario::TransferToKnown => {
                if pool.len() < 2 {
                    return Err(not_enough(pool.len()));
                }
                if pool.len() % 2 != 0 {
                    return Err(ConfigError::UnevenSplit { found: pool.len() });
                }
                let mut senders = pool.identities;
                let receivers = senders.split_off(senders.len() / 2);
                Ok(Self {
                    senders: IdentityPool::new(senders),
                    receivers: IdentityPool::new(receivers).address_only_view(),
                })
            }
            Scenario::TransferToSelf => {
                if pool.is_empty() {
                    return Err(not_enough(0));
                }
                let receivers = pool.address_only_view();
                Ok(Self {
                    senders: pool,
                    receivers,
                })
            }
            Scenario::TransferToRandom => {
                if pool.is_empty() {
                    return Err(not_enough(0));
                }
                let receivers = IdentityPool::synthesize_address_only(pool.len());
                Ok(Self {
                    senders: pool,
                    receivers,
                })
            }
        }
    }
}
