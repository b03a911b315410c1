//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every field
//! has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::client::ClientProfile;
use crate::client::profile::NORMAL;
use crate::scenario::spec::{default_scenarios, ScenarioSpec, DEFAULT_UPLOAD_SIZE};

/// Root configuration for the harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Endpoint under test.
    pub target: TargetConfig,

    /// Run-wide settings.
    pub run: RunConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Extra or overriding client profiles, applied on top of the built-ins.
    pub profiles: Vec<ProfileConfig>,

    /// Scenario list; empty means the built-in list.
    pub scenarios: Vec<ScenarioSpec>,
}

impl HarnessConfig {
    /// Built-in profiles followed by configured ones; a configured profile
    /// replaces a built-in of the same name.
    pub fn client_profiles(&self) -> Vec<ClientProfile> {
        let mut profiles = ClientProfile::builtin();
        profiles.extend(self.profiles.iter().map(ClientProfile::from));
        profiles
    }

    /// Configured scenarios, or the built-in list when none are configured.
    pub fn all_scenarios(&self) -> Vec<ScenarioSpec> {
        if self.scenarios.is_empty() {
            default_scenarios()
        } else {
            self.scenarios.clone()
        }
    }

    /// Scenarios to execute, in order, after `run.only` filtering.
    pub fn scenario_list(&self) -> Vec<ScenarioSpec> {
        let all = self.all_scenarios();
        if self.run.only.is_empty() {
            all
        } else {
            all.into_iter()
                .filter(|s| self.run.only.iter().any(|id| id == &s.id))
                .collect()
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the timeout endpoint (e.g., "http://127.0.0.1:8080").
    pub base_url: String,

    /// Profile used for the reachability ping.
    pub ping_profile: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            ping_profile: NORMAL.to_string(),
        }
    }
}

/// Run-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Upload size for scenarios that do not set their own.
    pub upload_size_bytes: usize,

    /// Scenario ids to run; empty runs all.
    pub only: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            upload_size_bytes: DEFAULT_UPLOAD_SIZE,
            only: Vec::new(),
        }
    }
}

/// A client profile as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    pub name: String,

    /// Connection establishment budget in milliseconds.
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,

    /// Budget between response bytes in milliseconds.
    pub read_ms: u64,

    /// Budget for each request chunk in milliseconds.
    pub write_ms: u64,
}

fn default_connect_ms() -> u64 {
    10_000
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
