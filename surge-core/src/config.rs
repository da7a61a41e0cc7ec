use crate::constants::*;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, warn};

/// Which identities send to which.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// The first half of the pool sends to the second half.
    TransferToKnown,
    /// Every identity sends to itself.
    TransferToSelf,
    /// Every identity sends to a freshly generated address.
    #[default]
    TransferToRandom,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::TransferToKnown => "transfer-to-known",
            Scenario::TransferToSelf => "transfer-to-self",
            Scenario::TransferToRandom => "transfer-to-random",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older config files use the `eth_transfer_to_*` spelling.
        let normalized = s.trim().trim_start_matches("eth_").replace('_', "-");
        match normalized.as_str() {
            "transfer-to-known" => Ok(Scenario::TransferToKnown),
            "transfer-to-self" => Ok(Scenario::TransferToSelf),
            "transfer-to-random" => Ok(Scenario::TransferToRandom),
            _ => Err(ConfigError::UnknownScenario(s.to_string())),
        }
    }
}

/// Parsed contents of the configuration file.
///
/// Built once before anything runs and then passed around by reference.
#[derive(Clone, Debug, Default)]
pub struct Config {
    pub common: CommonConfig,
    pub load: LoadConfig,
    pub keystore: KeyStoreConfig,
    pub seed: SeedConfig,
}

#[derive(Clone, Debug)]
pub struct CommonConfig {
    pub rpc_address: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            rpc_address: DEFAULT_RPC_ADDRESS.to_string(),
        }
    }
}

/// Everything the run loop needs to know about a load run.
#[derive(Clone, Debug)]
pub struct LoadConfig {
    pub scenario: Scenario,
    pub tpu: NonZeroU32,
    pub time_unit: Duration,
    pub duration: Duration,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub sending_amount: u64,
    pub chain_id: u64,
    pub warmup: Duration,
    pub sync_nonces: bool,
    pub node_count: usize,
    pub node_index: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            tpu: DEFAULT_TPU,
            time_unit: DEFAULT_TIME_UNIT,
            duration: DEFAULT_DURATION,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            sending_amount: DEFAULT_SENDING_AMOUNT,
            chain_id: DEFAULT_CHAIN_ID,
            warmup: DEFAULT_WARMUP,
            sync_nonces: false,
            node_count: 1,
            node_index: 0,
        }
    }
}

impl LoadConfig {
    /// Transactions sent per tick, as a window length.
    pub fn unit_size(&self) -> usize {
        self.tpu.get() as usize
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn tpu(mut self, tpu: NonZeroU32) -> Self {
        self.tpu = tpu;
        self
    }

    pub fn time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = time_unit;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyStoreConfig {
    /// `None` means `$HOME/test_accounts/pks.json`.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub acc_num: usize,
    pub genesis_path: PathBuf,
    pub bech_prefix: String,
    pub denom: String,
    pub amount: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            acc_num: DEFAULT_ACC_NUM,
            genesis_path: PathBuf::from(DEFAULT_GENESIS_PATH),
            bech_prefix: DEFAULT_BECH_PREFIX.to_string(),
            denom: DEFAULT_DENOM.to_string(),
            amount: ONE_ETH,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        debug!("parsing config data");
        let raw: RawConfig = toml::from_str(data)?;
        let config = raw.into_config()?;
        debug!("done parsing config data");
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    common: RawCommon,
    #[serde(alias = "evmtx")]
    load: RawLoad,
    keystore: RawKeyStore,
    #[serde(alias = "offchain_feeding")]
    seed: RawSeed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommon {
    #[serde(alias = "eth_jsonrpc_addr")]
    rpc_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLoad {
    scenario: Option<String>,
    #[serde(alias = "tpu")]
    transactions_per_time_unit: Option<u32>,
    time_unit: Option<String>,
    #[serde(alias = "duration")]
    total_duration: Option<String>,
    gas_limit: Option<u64>,
    gas_price: Option<u64>,
    #[serde(alias = "sending_amt")]
    sending_amount: Option<u64>,
    chain_id: Option<u64>,
    warmup: Option<String>,
    sync_nonces: Option<bool>,
    node_count: Option<usize>,
    node_index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawKeyStore {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSeed {
    acc_num: Option<usize>,
    #[serde(alias = "genesis_loc")]
    genesis_path: Option<PathBuf>,
    bech_prefix: Option<String>,
    denom: Option<String>,
    amount: Option<u64>,
}

impl RawConfig {
    fn into_config(self) -> Result<Config, ConfigError> {
        let common = CommonConfig {
            rpc_address: self
                .common
                .rpc_address
                .unwrap_or_else(|| DEFAULT_RPC_ADDRESS.to_string()),
        };

        Ok(Config {
            common,
            load: self.load.into_config()?,
            keystore: KeyStoreConfig {
                path: self.keystore.path,
            },
            seed: self.seed.into_config(),
        })
    }
}

impl RawLoad {
    fn into_config(self) -> Result<LoadConfig, ConfigError> {
        let defaults = LoadConfig::default();

        let scenario = match self.scenario {
            Some(name) => name.parse()?,
            None => defaults.scenario,
        };

        let tpu = match self.transactions_per_time_unit {
            Some(tpu) => NonZeroU32::new(tpu).ok_or(ConfigError::ZeroRate)?,
            None => defaults.tpu,
        };

        let time_unit = parse_duration("time_unit", self.time_unit, defaults.time_unit);
        if time_unit.is_zero() {
            return Err(ConfigError::ZeroTimeUnit);
        }

        let node_count = self.node_count.unwrap_or(defaults.node_count);
        let node_index = self.node_index.unwrap_or(defaults.node_index);
        if node_count == 0 || node_index >= node_count {
            return Err(ConfigError::NodePartition {
                index: node_index,
                count: node_count,
            });
        }

        Ok(LoadConfig {
            scenario,
            tpu,
            time_unit,
            duration: parse_duration("total_duration", self.total_duration, defaults.duration),
            gas_limit: self.gas_limit.unwrap_or(defaults.gas_limit),
            gas_price: self.gas_price.unwrap_or(defaults.gas_price),
            sending_amount: self.sending_amount.unwrap_or(defaults.sending_amount),
            chain_id: self.chain_id.unwrap_or(defaults.chain_id),
            warmup: parse_duration("warmup", self.warmup, defaults.warmup),
            sync_nonces: self.sync_nonces.unwrap_or(defaults.sync_nonces),
            node_count,
            node_index,
        })
    }
}

impl RawSeed {
    fn into_config(self) -> SeedConfig {
        let defaults = SeedConfig::default();
        SeedConfig {
            acc_num: self.acc_num.unwrap_or(defaults.acc_num),
            genesis_path: self.genesis_path.unwrap_or(defaults.genesis_path),
            bech_prefix: self.bech_prefix.unwrap_or(defaults.bech_prefix),
            denom: self.denom.unwrap_or(defaults.denom),
            amount: self.amount.unwrap_or(defaults.amount),
        }
    }
}

fn parse_duration(field: &str, raw: Option<String>, default: Duration) -> Duration {
    match raw {
        None => default,
        Some(raw) => match humantime::parse_duration(raw.trim()) {
            Ok(duration) => duration,
            Err(err) => {
                warn!(
                    "Invalid duration `{raw}` for `{field}` ({err}); using {}",
                    humantime::format_duration(default)
                );
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.common.rpc_address, DEFAULT_RPC_ADDRESS);
        assert_eq!(config.load.scenario, Scenario::TransferToRandom);
        assert_eq!(config.load.tpu, DEFAULT_TPU);
        assert_eq!(config.load.time_unit, Duration::from_secs(1));
        assert_eq!(config.load.duration, Duration::from_secs(600));
        assert_eq!(config.load.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.seed.acc_num, DEFAULT_ACC_NUM);
        assert!(config.keystore.path.is_none());
    }

    #[test]
    fn full_document() {
        let config = Config::from_toml_str(
            r#"
            [common]
            rpc_address = "http://10.0.0.1:8545"

            [load]
            scenario = "transfer-to-known"
            transactions_per_time_unit = 250
            time_unit = "100ms"
            total_duration = "2m"
            gas_limit = 21000
            gas_price = 7
            sending_amount = 3
            chain_id = 9000
            warmup = "0s"
            sync_nonces = true
            node_count = 4
            node_index = 2

            [keystore]
            path = "/tmp/keys.json"

            [seed]
            acc_num = 5
            genesis_path = "/tmp/genesis.json"
            bech_prefix = "evmos"
            denom = "aevmos"
            "#,
        )
        .unwrap();

        assert_eq!(config.common.rpc_address, "http://10.0.0.1:8545");
        let load = &config.load;
        assert_eq!(load.scenario, Scenario::TransferToKnown);
        assert_eq!(load.tpu.get(), 250);
        assert_eq!(load.time_unit, Duration::from_millis(100));
        assert_eq!(load.duration, Duration::from_secs(120));
        assert_eq!(load.gas_limit, 21_000);
        assert_eq!(load.gas_price, 7);
        assert_eq!(load.sending_amount, 3);
        assert_eq!(load.chain_id, 9000);
        assert_eq!(load.warmup, Duration::ZERO);
        assert!(load.sync_nonces);
        assert_eq!((load.node_count, load.node_index), (4, 2));
        assert_eq!(
            config.keystore.path.as_deref(),
            Some(std::path::Path::new("/tmp/keys.json"))
        );
        assert_eq!(config.seed.acc_num, 5);
        assert_eq!(config.seed.bech_prefix, "evmos");
        assert_eq!(config.seed.amount, ONE_ETH);
    }

    #[test]
    fn legacy_names_are_accepted() {
        let config = Config::from_toml_str(
            r#"
            [common]
            eth_jsonrpc_addr = "http://node:8545"

            [evmtx]
            scenario = "eth_transfer_to_self"
            tpu = 3
            duration = "30s"
            sending_amt = 9

            [offchain_feeding]
            genesis_loc = "g.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.common.rpc_address, "http://node:8545");
        assert_eq!(config.load.scenario, Scenario::TransferToSelf);
        assert_eq!(config.load.tpu.get(), 3);
        assert_eq!(config.load.duration, Duration::from_secs(30));
        assert_eq!(config.load.sending_amount, 9);
        assert_eq!(config.seed.genesis_path, PathBuf::from("g.json"));
    }

    #[test]
    fn unknown_scenario_is_fatal() {
        let err = Config::from_toml_str("[load]\nscenario = \"erc20_transfer\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScenario(name) if name == "erc20_transfer"));
    }

    #[test]
    fn zero_rate_is_fatal() {
        let err = Config::from_toml_str("[load]\ntpu = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRate));
    }

    #[test]
    fn zero_time_unit_is_fatal() {
        let err = Config::from_toml_str("[load]\ntime_unit = \"0s\"").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeUnit));
    }

    #[test]
    fn node_index_out_of_range_is_fatal() {
        let err = Config::from_toml_str("[load]\nnode_count = 2\nnode_index = 2").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NodePartition { index: 2, count: 2 }
        ));
    }

    #[test]
    #[tracing_test::traced_test]
    fn invalid_duration_falls_back_to_default() {
        let config = Config::from_toml_str("[load]\ntotal_duration = \"ten minutes\"").unwrap();
        assert_eq!(config.load.duration, DEFAULT_DURATION);
        assert!(logs_contain("Invalid duration"));
    }

    #[test]
    fn scenario_parsing() {
        assert_eq!(
            "transfer_to_random".parse::<Scenario>().unwrap(),
            Scenario::TransferToRandom
        );
        assert_eq!(
            "eth_transfer_to_known".parse::<Scenario>().unwrap(),
            Scenario::TransferToKnown
        );
        assert!("transfer".parse::<Scenario>().is_err());
        assert_eq!(Scenario::TransferToSelf.to_string(), "transfer-to-self");
    }
}
