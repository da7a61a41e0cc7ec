//! Private keys persisted as a JSON array of hex strings.
use std::fs;
use std::path::{Path, PathBuf};
use surge::{IdentityPool, KeyError};
use surge_core::{DEFAULT_KEYSTORE_DIR, DEFAULT_KEYSTORE_FILE};
use thiserror::Error;
#[allow(unused)]
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("failed to access key store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key store {path} is not a JSON array of strings: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("key store {path}: {source}")]
    Key {
        path: PathBuf,
        #[source]
        source: KeyError,
    },
}

/// `$HOME/test_accounts/pks.json`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_KEYSTORE_DIR).join(DEFAULT_KEYSTORE_FILE))
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every key. Missing file, bad JSON, bad hex, invalid scalar and duplicates all fail.
    pub fn load(&self) -> Result<IdentityPool, KeyStoreError> {
        debug!("loading identities from {}", self.path.display());
        let data = fs::read(&self.path).map_err(|source| KeyStoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let keys: Vec<String> =
            serde_json::from_slice(&data).map_err(|source| KeyStoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        IdentityPool::from_secret_keys(&keys).map_err(|source| KeyStoreError::Key {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with the keys of `pool`, creating parent directories.
    pub fn write(&self, pool: &IdentityPool) -> Result<usize, KeyStoreError> {
        let io_err = |source| KeyStoreError::Io {
            path: self.path.clone(),
            source,
        };

        let keys: Vec<String> = pool.iter().filter_map(|identity| identity.secret_hex()).collect();
        let data = serde_json::to_vec_pretty(&keys).map_err(|source| KeyStoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, data).map_err(io_err)?;
        info!("Wrote {} private keys to {}", keys.len(), self.path.display());
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge::Identity;

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("nested").join("pks.json"));
        let pool = IdentityPool::generate(5);

        assert_eq!(store.write(&pool).unwrap(), 5);
        let loaded = store.load().unwrap();

        let expected: Vec<_> = pool.iter().map(Identity::address).collect();
        let actual: Vec<_> = loaded.iter().map(Identity::address).collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("pks.json"));
        store.write(&IdentityPool::generate(4)).unwrap();
        store.write(&IdentityPool::generate(2)).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeyStore::new(dir.path().join("absent.json")).load().unwrap_err();
        assert!(matches!(err, KeyStoreError::Io { .. }));
    }

    #[test]
    fn malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pks.json");
        fs::write(&path, r#"{"keys": []}"#).unwrap();
        assert!(matches!(
            KeyStore::new(&path).load().unwrap_err(),
            KeyStoreError::Json { .. }
        ));
    }

    #[test]
    fn duplicate_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pks.json");
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        fs::write(&path, serde_json::to_vec(&[key, key]).unwrap()).unwrap();
        assert!(matches!(
            KeyStore::new(&path).load().unwrap_err(),
            KeyStoreError::Key {
                source: KeyError::DuplicateKey { index: 1 },
                ..
            }
        ));
    }
}
