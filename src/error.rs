//! Harness-level error taxonomy.
//!
//! Only these errors escape a run. Everything that goes wrong inside a
//! scenario is caught by the runner and turned into a verdict instead.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::gateway::TransportError;

/// Errors that abort a run (or prevent one from starting).
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A scenario or the ping precondition names a profile that was never registered.
    #[error("unknown client profile '{0}'")]
    UnknownProfile(String),

    /// A profile carries a zero budget.
    #[error("invalid client profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    /// The ping precondition failed.
    #[error("server unreachable at {base_url}: {source}")]
    ServerUnreachable {
        base_url: String,
        #[source]
        source: TransportError,
    },

    /// reqwest refused to build a client for a profile.
    #[error("failed to build HTTP client for profile '{profile}': {source}")]
    ClientBuild {
        profile: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
