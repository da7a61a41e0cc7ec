use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

pub const DEFAULT_RPC_ADDRESS: &str = "http://localhost:8545";

pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
pub const DEFAULT_GAS_PRICE: u64 = 201_417_240;
pub const DEFAULT_SENDING_AMOUNT: u64 = 1;
pub const DEFAULT_CHAIN_ID: u64 = 1_124_124;

pub const DEFAULT_TPU: NonZeroU32 = unsafe { NonZeroU32::new_unchecked(10) };
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10 * 60);

/// Pause between loading identities and the first tick.
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(3);

pub const DEFAULT_KEYSTORE_DIR: &str = "test_accounts";
pub const DEFAULT_KEYSTORE_FILE: &str = "pks.json";

pub const DEFAULT_ACC_NUM: usize = 100;
pub const DEFAULT_GENESIS_PATH: &str = "genesis.json";
pub const DEFAULT_BECH_PREFIX: &str = "canto";
pub const DEFAULT_DENOM: &str = "acanto";

/// 1 ETH in wei, the balance handed to every seeded account.
pub const ONE_ETH: u64 = 1_000_000_000_000_000_000;
