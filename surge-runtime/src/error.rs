use crate::genesis::GenesisError;
use crate::keystore::KeyStoreError;
use std::path::PathBuf;
use surge_core::{ConfigError, InvariantViolation, SurgeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Surge(#[from] SurgeError),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no home directory to place the key store in, set `keystore.path`")]
    NoHomeDir,

    #[error("run halted: {0}")]
    Halted(InvariantViolation),
}
