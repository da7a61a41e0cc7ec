//! Command line runtime.
//!
//! Loads the config file once, then either drives a load run against the configured endpoint or
//! seeds funded accounts into a genesis file.
use crate::error::RuntimeError;
use crate::genesis::Genesis;
use crate::keystore::{self, KeyStore};
use crate::logging;
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use surge::{sync_nonces, EthRpc, HttpRpcClient, Identity, IdentityPool, Roles};
use surge_core::{Config, RunStatistics, Scenario, StopReason, DEFAULT_CONFIG_PATH};
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Rate-controlled transfer load against an EVM JSON-RPC endpoint")]
struct SurgeCli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging for the surge crates.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send transfers at the configured rate until the deadline.
    #[command(alias = "evmtx")]
    Run {
        #[arg(long)]
        rpc_address: Option<String>,

        #[arg(long)]
        scenario: Option<Scenario>,

        /// Transactions per time unit.
        #[arg(long)]
        tpu: Option<NonZeroU32>,

        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Fund fresh accounts in a genesis file and write their keys to the key store.
    #[command(alias = "offchain_feeding")]
    Seed {
        #[arg(long)]
        acc_num: Option<usize>,

        #[arg(long)]
        genesis: Option<PathBuf>,
    },
}

/// Default surge runtime.
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     match SurgeRuntime::new().with_args().run().await {
///         Ok(()) => std::process::ExitCode::SUCCESS,
///         Err(_) => std::process::ExitCode::FAILURE,
///     }
/// }
/// ```
pub struct SurgeRuntime {
    config_path: PathBuf,
    verbose: bool,
    command: Command,
}

impl Default for SurgeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SurgeRuntime {
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            verbose: false,
            command: Command::Run {
                rpc_address: None,
                scenario: None,
                tpu: None,
                duration: None,
            },
        }
    }

    /// Take the config path, verbosity and subcommand from the process arguments.
    ///
    /// `surge [-c config.toml] [-v] run [--rpc-address URL] [--scenario NAME] [--tpu N] [--duration 10m]`
    ///
    /// `surge [-c config.toml] [-v] seed [--acc-num N] [--genesis PATH]`
    pub fn with_args(mut self) -> Self {
        let args = SurgeCli::parse();
        self.config_path = args.config;
        self.verbose = args.verbose;
        self.command = args.command;
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.command = command;
        self
    }

    pub async fn run(self) -> Result<(), RuntimeError> {
        logging::init(self.verbose);
        self.execute().await
    }

    #[instrument(name = "surge", skip_all)]
    async fn execute(self) -> Result<(), RuntimeError> {
        let mut config = load_config(&self.config_path)?;

        match self.command {
            Command::Run {
                rpc_address,
                scenario,
                tpu,
                duration,
            } => {
                if let Some(rpc_address) = rpc_address {
                    config.common.rpc_address = rpc_address;
                }
                if let Some(scenario) = scenario {
                    config.load.scenario = scenario;
                }
                if let Some(tpu) = tpu {
                    config.load.tpu = tpu;
                }
                if let Some(duration) = duration {
                    config.load.duration = duration;
                }

                let rpc = Arc::new(HttpRpcClient::new(config.common.rpc_address.clone())?);
                info!("Targeting {}", rpc.url());
                halt_on_violation(run_load(&config, rpc).await?)?;
                Ok(())
            }
            Command::Seed { acc_num, genesis } => {
                if let Some(acc_num) = acc_num {
                    config.seed.acc_num = acc_num;
                }
                if let Some(genesis) = genesis {
                    config.seed.genesis_path = genesis;
                }
                seed_accounts(&config).await?;
                Ok(())
            }
        }
    }
}

/// Read the config file. A missing file means all defaults.
pub fn load_config(path: &Path) -> Result<Config, RuntimeError> {
    match std::fs::read_to_string(path) {
        Ok(data) => {
            let config = Config::from_toml_str(&data)?;
            debug!("Loaded config from {}", path.display());
            Ok(config)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path.display());
            Ok(Config::default())
        }
        Err(source) => Err(RuntimeError::ConfigFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// A run that stopped on an invariant violation is an error; any other stop is a normal finish.
pub fn halt_on_violation(stats: RunStatistics) -> Result<RunStatistics, RuntimeError> {
    match stats.stop_reason {
        StopReason::Violation(violation) => Err(RuntimeError::Halted(violation)),
        _ => Ok(stats),
    }
}

fn key_store(config: &Config) -> Result<KeyStore, RuntimeError> {
    let path = match &config.keystore.path {
        Some(path) => path.clone(),
        None => keystore::default_path().ok_or(RuntimeError::NoHomeDir)?,
    };
    Ok(KeyStore::new(path))
}

/// Load identities, prepare roles and drive the run loop to completion.
pub async fn run_load(
    config: &Config,
    rpc: Arc<dyn EthRpc>,
) -> Result<RunStatistics, RuntimeError> {
    let load = &config.load;
    let store = key_store(config)?;
    let pool = store
        .load()?
        .partition_for_node(load.node_count, load.node_index)?;
    info!(
        "Loaded {} identities from {} for node {}/{}",
        pool.len(),
        store.path().display(),
        load.node_index + 1,
        load.node_count
    );

    let mut roles = Roles::prepare(load.scenario, pool)?;
    if load.sync_nonces {
        sync_nonces(&mut roles.senders, rpc.as_ref()).await?;
    }

    if !load.warmup.is_zero() {
        info!("Warming up for {}", humantime::format_duration(load.warmup));
        tokio::time::sleep(load.warmup).await;
    }

    Ok(surge::run(load, &mut roles, rpc).await?)
}

/// Generate `acc_num` identities, fund them in the genesis file and persist their keys.
pub async fn seed_accounts(config: &Config) -> Result<IdentityPool, RuntimeError> {
    let seed = &config.seed;
    let store = key_store(config)?;
    let mut genesis = Genesis::read(&seed.genesis_path)?;

    info!("Creating {} new accounts", seed.acc_num);
    let identities = join_all((0..seed.acc_num).map(|_| tokio::task::spawn_blocking(Identity::random)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| surge_core::SurgeError::Task(e.to_string()))?;
    let pool = IdentityPool::new(identities);
    debug!("Done creating new accounts");

    genesis.fund(&pool, seed)?;
    genesis.write(&seed.genesis_path)?;
    store.write(&pool)?;
    Ok(pool)
}
