use crate::config::Scenario;
use thiserror::Error;

/// Problems found before a run starts. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid scenario `{0}` (expected transfer-to-known, transfer-to-self or transfer-to-random)")]
    UnknownScenario(String),

    #[error("transactions per time unit must be greater than zero")]
    ZeroRate,

    #[error("time unit must be greater than zero")]
    ZeroTimeUnit,

    #[error("{window} transactions per time unit exceeds the {available} available identities")]
    WindowTooLarge { window: usize, available: usize },

    #[error("not enough identities for the {scenario} scenario (found {found})")]
    NotEnoughIdentities { scenario: Scenario, found: usize },

    #[error("transfer-to-known needs an even number of identities to pair senders with receivers (found {found})")]
    UnevenSplit { found: usize },

    #[error("node index {index} is out of range for {count} node(s)")]
    NodePartition { index: usize, count: usize },

    #[error("failed to decode config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A correctness assertion of the run loop tripped. The run halts immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("sender {address} selected again in tick {tick} before the rotation wrapped")]
    DuplicateAddress { address: String, tick: u64 },

    #[error("content identifier {content_id} seen again in tick {tick}")]
    DuplicateContentId { content_id: String, tick: u64 },
}

#[derive(Debug, Error)]
pub enum SurgeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to sign transaction for sender #{index}: {message}")]
    Signing { index: usize, message: String },

    #[error("failed to query pending nonce of {address}: {message}")]
    NonceQuery { address: String, message: String },

    #[error("worker task failed: {0}")]
    Task(String),
}
