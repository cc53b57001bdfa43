//! Common types for the key-pool workspace

mod config;
mod error;
mod secret;

pub use config::{Config, PoolConfig, StoreConfig};
pub use error::{Error, Result};
pub use secret::Secret;
