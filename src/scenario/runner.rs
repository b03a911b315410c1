//! Sequential scenario execution.
//!
//! # Responsibilities
//! - Check every profile reference before touching the network
//! - Ping the endpoint once; a failed ping skips every scenario
//! - Run scenarios one at a time, in declaration order
//! - Classify each result and append a verdict to the sink
//! - Stop cooperatively on shutdown: between scenarios, or mid-transfer by
//!   dropping the in-flight scenario (which closes its connection)
//!
//! # Design Decisions
//! - No retries; each scenario executes exactly once per run
//! - Only `UnknownProfile` and client build failures escape as errors

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use rand::RngCore;
use uuid::Uuid;

use crate::client::profile::NORMAL;
use crate::client::{HarnessClient, ProfileRegistry};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::gateway::{Direction, EndpointGateway, TransportError};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::observability::{ResultSink, TracingSink};
use crate::outcome::{classify, Failure};
use crate::scenario::spec::{ScenarioSpec, DEFAULT_UPLOAD_SIZE};
use crate::scenario::verdict::{RunReport, RunStatus, ScenarioState, Verdict, SKIPPED_PRECONDITION};
use crate::transfer::{self, TransferResult};

/// Executes an ordered scenario list against one endpoint.
pub struct ScenarioRunner {
    registry: Arc<ProfileRegistry>,
    gateway: EndpointGateway,
    scenarios: Vec<ScenarioSpec>,
    ping_profile: String,
    upload_size: usize,
    sink: Arc<dyn ResultSink>,
    shutdown: ShutdownSignal,
}

impl ScenarioRunner {
    pub fn new(registry: Arc<ProfileRegistry>, gateway: EndpointGateway, scenarios: Vec<ScenarioSpec>) -> Self {
        Self {
            registry,
            gateway,
            scenarios,
            ping_profile: NORMAL.to_string(),
            upload_size: DEFAULT_UPLOAD_SIZE,
            sink: Arc::new(TracingSink),
            shutdown: ShutdownSignal::never(),
        }
    }

    /// Runner for a loaded configuration.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let registry = ProfileRegistry::new(config.client_profiles())?;
        let gateway = EndpointGateway::new(&config.target.base_url)?;
        Ok(Self::new(Arc::new(registry), gateway, config.scenario_list())
            .with_ping_profile(&config.target.ping_profile)
            .with_upload_size(config.run.upload_size_bytes))
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_ping_profile(mut self, profile: &str) -> Self {
        self.ping_profile = profile.to_string();
        self
    }

    pub fn with_upload_size(mut self, bytes: usize) -> Self {
        self.upload_size = bytes;
        self
    }

    pub fn scenarios(&self) -> &[ScenarioSpec] {
        &self.scenarios
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Execute the whole list once.
    pub async fn run(&self) -> HarnessResult<RunReport> {
        let run_id = Uuid::new_v4();
        let base_url = self.gateway.base_url().to_string();

        self.check_profiles()?;

        tracing::info!(
            run_id = %run_id,
            base_url = %base_url,
            scenarios = self.scenarios.len(),
            "Run starting"
        );

        let mut report = RunReport {
            run_id,
            base_url,
            status: RunStatus::Completed,
            verdicts: Vec::with_capacity(self.scenarios.len()),
        };

        if self.shutdown.is_triggered() {
            self.abort_from(0, "cancelled before start", &mut report);
            report.status = RunStatus::Cancelled;
            return Ok(self.finish(report));
        }

        for spec in &self.scenarios {
            tracing::debug!(
                run_id = %run_id,
                scenario = %spec.id,
                state = ?ScenarioState::Pending,
                "Scenario queued"
            );
        }

        let mut shutdown = self.shutdown.clone();
        let ping = tokio::select! {
            biased;
            _ = shutdown.triggered() => None,
            result = self.ping() => Some(result?),
        };

        match ping {
            None => {
                tracing::warn!(run_id = %run_id, "Run cancelled during ping");
                self.abort_from(0, "cancelled before start", &mut report);
                report.status = RunStatus::Cancelled;
                return Ok(self.finish(report));
            }
            Some(Err(reason)) => {
                tracing::error!(run_id = %run_id, reason = %reason, "Ping failed, skipping all scenarios");
                self.abort_from(0, &format!("{}: {}", SKIPPED_PRECONDITION, reason), &mut report);
                report.status = RunStatus::ServerUnreachable { reason };
                return Ok(self.finish(report));
            }
            Some(Ok(_)) => {}
        }

        for (index, spec) in self.scenarios.iter().enumerate() {
            if self.shutdown.is_triggered() {
                tracing::warn!(run_id = %run_id, scenario = %spec.id, "Run cancelled between scenarios");
                self.abort_from(index, "cancelled before start", &mut report);
                report.status = RunStatus::Cancelled;
                break;
            }

            let client = self.registry.get(&spec.profile).await?;
            let mut shutdown = self.shutdown.clone();
            let started = Instant::now();

            tracing::info!(
                run_id = %run_id,
                scenario = %spec.id,
                profile = %spec.profile,
                route = %spec.route,
                state = ?ScenarioState::Running,
                "Scenario starting"
            );

            let verdict = tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    tracing::warn!(run_id = %run_id, scenario = %spec.id, "Run cancelled mid-scenario");
                    Verdict::aborted(spec, "cancelled mid-scenario; connection dropped")
                }
                result = self.execute(spec, &client) => {
                    let actual = classify(&result);
                    if let Ok(transfer) = &result {
                        metrics::record_transfer(spec.route.direction(), transfer.bytes_moved);
                    }
                    let verdict = Verdict::completed(spec, &client.budget(), &result, actual);
                    tracing::info!(
                        run_id = %run_id,
                        scenario = %spec.id,
                        expected = %verdict.expected,
                        actual = %verdict.actual,
                        passed = verdict.passed,
                        elapsed = ?started.elapsed(),
                        "Scenario finished"
                    );
                    verdict
                }
            };

            let cancelled = verdict.state == ScenarioState::Aborted;
            metrics::record_verdict(&verdict, started.elapsed());
            self.record(verdict, &mut report);
            if cancelled {
                self.abort_from(index + 1, "cancelled before start", &mut report);
                report.status = RunStatus::Cancelled;
                break;
            }
        }

        Ok(self.finish(report))
    }

    fn check_profiles(&self) -> HarnessResult<()> {
        self.registry.profile(&self.ping_profile)?;
        for spec in &self.scenarios {
            self.registry.profile(&spec.profile)?;
        }
        Ok(())
    }

    /// `Ok(Err(reason))` when the endpoint is unreachable.
    async fn ping(&self) -> HarnessResult<Result<String, String>> {
        let client = self.registry.get(&self.ping_profile).await?;
        match self.gateway.ping(&client).await {
            Ok(ack) => {
                tracing::info!(ack = %ack.trim(), "Endpoint reachable");
                Ok(Ok(ack))
            }
            Err(err @ HarnessError::ServerUnreachable { .. }) => Ok(Err(err.to_string())),
            Err(err) => Err(err),
        }
    }

    /// Drive one scenario's endpoint call and transfer, without the ping,
    /// the cancellation race or verdict bookkeeping.
    pub async fn execute(
        &self,
        spec: &ScenarioSpec,
        client: &HarnessClient,
    ) -> Result<TransferResult, Failure> {
        let hint = spec.server_delay();
        match spec.route.direction() {
            Direction::Download => {
                let body = self
                    .gateway
                    .download(client, spec.route, hint)
                    .await
                    .map_err(Failure::read)?;
                transfer::download(body, &spec.rate).await.map_err(Failure::read)
            }
            Direction::Upload => {
                let payload = self.payload(spec);
                let mut upload = self
                    .gateway
                    .upload(client, spec.route, hint)
                    .map_err(Failure::write)?;

                match transfer::upload(upload.sink(), &payload, &spec.rate).await {
                    Ok(result) => {
                        let ack = upload.acknowledge().await.map_err(Failure::read)?;
                        tracing::debug!(scenario = %spec.id, ack = %ack.trim(), "Upload acknowledged");
                        Ok(result)
                    }
                    Err(TransportError::Closed) => {
                        let cause = upload.into_failure().await.unwrap_or(TransportError::Closed);
                        Err(Failure::write(cause))
                    }
                    Err(err) => Err(Failure::write(err)),
                }
            }
            Direction::Probe => Err(Failure::read(TransportError::Misrouted(spec.route))),
        }
    }

    fn payload(&self, spec: &ScenarioSpec) -> Bytes {
        let mut buf = vec![0u8; spec.payload_bytes.unwrap_or(self.upload_size)];
        rand::thread_rng().fill_bytes(&mut buf);
        Bytes::from(buf)
    }

    fn record(&self, verdict: Verdict, report: &mut RunReport) {
        self.sink.append(&verdict.render());
        report.verdicts.push(verdict);
    }

    fn abort_from(&self, start: usize, reason: &str, report: &mut RunReport) {
        for spec in &self.scenarios[start..] {
            self.record(Verdict::aborted(spec, reason), report);
        }
    }

    fn finish(&self, report: RunReport) -> RunReport {
        self.sink.append(&report.summary());
        tracing::info!(
            run_id = %report.run_id,
            status = %report.status,
            failures = report.failures().count(),
            "Run finished"
        );
        report
    }
}
