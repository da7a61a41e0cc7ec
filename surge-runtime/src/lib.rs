pub mod runtime;

mod error;
pub mod genesis;
pub mod keystore;
mod logging;

pub use crate::error::RuntimeError;
pub use crate::runtime::{Command, SurgeRuntime};
