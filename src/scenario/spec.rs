//! Declarative scenario definitions and the built-in scenario list.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::profile::{LONG, NORMAL, SHORT_READ, SHORT_WRITE};
use crate::gateway::Route;
use crate::outcome::OutcomeKind;
use crate::transfer::RatePlan;

/// Default upload payload: 5 MiB.
pub const DEFAULT_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Whether a scenario's outcome can be forced from the client side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reproducibility {
    /// The outcome follows from budget vs. delay alone.
    #[default]
    Deterministic,
    /// The outcome depends on a server-side budget and on kernel buffering,
    /// neither of which the harness controls.
    BestEffort,
}

/// One (profile, route, delay, expectation) unit, executed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Client profile name.
    pub profile: String,
    pub route: Route,
    /// Server delay hint in milliseconds; the route default applies when absent.
    #[serde(default)]
    pub server_delay_ms: Option<u64>,
    /// Upload size; the run's default applies when absent.
    #[serde(default)]
    pub payload_bytes: Option<usize>,
    #[serde(default)]
    pub rate: RatePlan,
    pub expected: OutcomeKind,
    #[serde(default)]
    pub reproducibility: Reproducibility,
}

impl ScenarioSpec {
    pub fn new(id: &str, profile: &str, route: Route, expected: OutcomeKind) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            profile: profile.to_string(),
            route,
            server_delay_ms: None,
            payload_bytes: None,
            rate: RatePlan::default(),
            expected,
            reproducibility: Reproducibility::Deterministic,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.server_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn with_payload(mut self, bytes: usize) -> Self {
        self.payload_bytes = Some(bytes);
        self
    }

    pub fn with_rate(mut self, rate: RatePlan) -> Self {
        self.rate = rate;
        self
    }

    pub fn best_effort(mut self) -> Self {
        self.reproducibility = Reproducibility::BestEffort;
        self
    }

    pub fn server_delay(&self) -> Option<Duration> {
        self.server_delay_ms.map(Duration::from_millis)
    }

    /// Delay the server is asked to apply, after route defaults.
    pub fn effective_delay(&self) -> Option<Duration> {
        self.route.effective_delay(self.server_delay())
    }
}

/// The fixed, ordered scenario list.
pub fn default_scenarios() -> Vec<ScenarioSpec> {
    let six_seconds = Duration::from_millis(6_000);
    vec![
        ScenarioSpec::new(
            "client-read-timeout",
            SHORT_READ,
            Route::DownloadSlowServer,
            OutcomeKind::ClientReadTimeout,
        )
        .describe("server pauses between chunks longer than the client's read budget")
        .with_delay(six_seconds),
        ScenarioSpec::new(
            "client-read-ok",
            LONG,
            Route::DownloadSlowServer,
            OutcomeKind::Success,
        )
        .describe("same slow download with a read budget above the server pause")
        .with_delay(six_seconds),
        ScenarioSpec::new(
            "client-write-timeout",
            SHORT_WRITE,
            Route::UploadSlowServer,
            OutcomeKind::ClientWriteTimeout,
        )
        .describe("server reads the upload slower than the client's write budget allows")
        .with_delay(six_seconds),
        ScenarioSpec::new(
            "client-write-ok",
            LONG,
            Route::UploadSlowServer,
            OutcomeKind::Success,
        )
        .describe("same slow upload with a write budget above the server pause")
        .with_delay(six_seconds),
        ScenarioSpec::new(
            "client-ack-timeout",
            SHORT_READ,
            Route::UploadSlowResponse,
            OutcomeKind::ClientReadTimeout,
        )
        .describe("upload completes but the acknowledgement arrives after the read budget")
        .with_delay(Duration::from_millis(8_000))
        .with_payload(64 * 1024),
        ScenarioSpec::new(
            "large-download",
            NORMAL,
            Route::DownloadLargeFile,
            OutcomeKind::Success,
        )
        .describe("baseline: large download at full speed")
        .with_rate(RatePlan::throttled(64 * 1024, 0, Duration::ZERO)),
        ScenarioSpec::new("normal-upload", NORMAL, Route::UploadNormal, OutcomeKind::Success)
            .describe("baseline: upload at full speed"),
        ScenarioSpec::new(
            "server-write-timeout",
            NORMAL,
            Route::DownloadExpectSlowClient,
            OutcomeKind::Unclassified,
        )
        .describe("client stops reading so the server's write budget expires mid-body")
        .with_rate(RatePlan::throttled(64 * 1024, 16, Duration::from_millis(10_000)))
        .best_effort(),
        ScenarioSpec::new(
            "server-write-path",
            NORMAL,
            Route::DownloadServerWriteTimeout,
            OutcomeKind::Unclassified,
        )
        .describe("slow consumption against the server's write-timeout route")
        .with_rate(RatePlan::throttled(64 * 1024, 16, Duration::from_millis(10_000)))
        .best_effort(),
        ScenarioSpec::new(
            "server-read-timeout",
            NORMAL,
            Route::UploadExpectFastClient,
            OutcomeKind::Unclassified,
        )
        .describe("client pauses its upload so the server's inbound read budget expires")
        .with_payload(1024 * 1024)
        .with_rate(RatePlan::throttled(64 * 1024, 4, Duration::from_millis(5_000)))
        .best_effort(),
    ]
}
