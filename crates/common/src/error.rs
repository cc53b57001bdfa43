//! Workspace-wide plumbing errors
//!
//! Covers the failure modes the shared plumbing can hit: a bad
//! configuration value, an unreadable file, malformed TOML. The pool crate
//! carries its own richer error type; this one stays deliberately small.

use thiserror::Error;

/// Error for configuration and file handling shared across the workspace.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using the workspace Error
pub type Result<T> = std::result::Result<T, Error>;
