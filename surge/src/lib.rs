#![cfg_attr(docsrs, feature(doc_cfg))]
//! Throughput-controlled transfer load against an Ethereum JSON-RPC endpoint.
//!
//! Each tick selects a rotating window of senders, signs one transfer per sender in parallel,
//! fires the whole batch concurrently, and sleeps out the rest of the time unit.
//!
//! ```no_run
//! use std::sync::Arc;
//! use surge::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoadConfig::default();
//! let pool = IdentityPool::generate(100);
//! let mut roles = Roles::prepare(config.scenario, pool)?;
//! let rpc = Arc::new(HttpRpcClient::new("http://localhost:8545")?);
//!
//! let stats = surge::run(&config, &mut roles, rpc).await?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod builder;
pub mod classify;
pub mod client;
pub mod dispatch;
pub mod guard;
pub mod measurement;
pub mod pacer;
pub mod scenario;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{Identity, IdentityPool, KeyError, Roles};
pub use client::{sync_nonces, EthRpc, HttpRpcClient};
pub use scenario::run;

pub mod prelude {
    pub use crate::account::{Identity, IdentityPool, Roles};
    pub use crate::client::{sync_nonces, EthRpc, HttpRpcClient};
    pub use crate::scenario::run;

    pub use surge_core::{Config, LoadConfig, RunStatistics, Scenario, StopReason, SurgeError};
}
