//! Typed view of an Ethermint genesis file, enough to fund fresh accounts.
//!
//! Fields the seeding workflow does not touch are carried through `rest` untouched.
use alloy_primitives::{Address, U256};
use bech32::{ToBase32, Variant};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use surge::IdentityPool;
use surge_core::SeedConfig;
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, info};

pub const ETH_ACCOUNT_TYPE: &str = "/ethermint.types.v1.EthAccount";

/// Code hash of an account without code.
pub const EMPTY_CODE_HASH: &str =
    "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("failed to access genesis file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("genesis file {path} is malformed: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode bech32 address: {0}")]
    Bech32(#[from] bech32::Error),

    #[error("genesis has no total supply to increase")]
    NoSupply,

    #[error("invalid amount `{0}` in genesis")]
    InvalidAmount(String),
}

type Rest = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genesis {
    pub app_state: AppState,
    #[serde(flatten)]
    pub rest: Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub auth: AuthState,
    pub bank: BankState,
    #[serde(flatten)]
    pub rest: Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(flatten)]
    pub rest: Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankState {
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub supply: Vec<Coin>,
    #[serde(flatten)]
    pub rest: Rest,
}

/// Any account kind. Only accounts with a `base_account` take part in numbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAccount {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_account: Option<BaseAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_hash: Option<String>,
    #[serde(flatten)]
    pub rest: Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: String,
    pub pub_key: Option<Value>,
    pub account_number: String,
    pub sequence: String,
    #[serde(flatten)]
    pub rest: Rest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: String,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

pub fn bech32_address(prefix: &str, address: Address) -> Result<String, GenesisError> {
    Ok(bech32::encode(
        prefix,
        address.as_slice().to_base32(),
        Variant::Bech32,
    )?)
}

impl Genesis {
    pub fn read(path: &Path) -> Result<Self, GenesisError> {
        let data = fs::read(path).map_err(|source| GenesisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| GenesisError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), GenesisError> {
        let data = serde_json::to_vec(self).map_err(|source| GenesisError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, data).map_err(|source| GenesisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    /// Highest account number in use, if any account carries one.
    pub fn latest_account_number(&self) -> Option<u64> {
        self.app_state
            .auth
            .accounts
            .iter()
            .filter_map(|account| account.base_account.as_ref())
            .filter_map(|base| base.account_number.parse().ok())
            .max()
    }

    /// Append an EthAccount and a balance of `config.amount` for every identity, and grow the
    /// first supply coin by the total handed out.
    pub fn fund(&mut self, pool: &IdentityPool, config: &SeedConfig) -> Result<(), GenesisError> {
        let first_number = self.latest_account_number().map_or(0, |n| n + 1);
        info!(
            "Adding {} accounts starting at account number {first_number}",
            pool.len()
        );

        let supply = self
            .app_state
            .bank
            .supply
            .first_mut()
            .ok_or(GenesisError::NoSupply)?;
        let current = U256::from_str_radix(&supply.amount, 10)
            .map_err(|_| GenesisError::InvalidAmount(supply.amount.clone()))?;
        let added = U256::from(config.amount) * U256::from(pool.len() as u64);
        supply.amount = (current + added).to_string();

        for (offset, identity) in pool.iter().enumerate() {
            let address = bech32_address(&config.bech_prefix, identity.address())?;
            self.app_state.auth.accounts.push(GenesisAccount {
                type_url: ETH_ACCOUNT_TYPE.to_string(),
                base_account: Some(BaseAccount {
                    address: address.clone(),
                    pub_key: None,
                    account_number: (first_number + offset as u64).to_string(),
                    sequence: "0".to_string(),
                    rest: Rest::new(),
                }),
                code_hash: Some(EMPTY_CODE_HASH.to_string()),
                rest: Rest::new(),
            });
            self.app_state.bank.balances.push(Balance {
                address,
                coins: vec![Coin {
                    denom: config.denom.clone(),
                    amount: config.amount.to_string(),
                }],
            });
        }
        Ok(())
    }
}
