//! End-to-end scenario runs against the in-process mock endpoint.
//!
//! Budgets and delays are scaled down to milliseconds; the budget/delay
//! relationships match the built-in scenarios.

mod common;

use std::sync::Arc;
use std::time::Duration;

use timeout_harness::config::HarnessConfig;
use timeout_harness::gateway::{EndpointGateway, Route};
use timeout_harness::lifecycle::Shutdown;
use timeout_harness::observability::MemorySink;
use timeout_harness::outcome::{classify, Failure, OutcomeKind};
use timeout_harness::scenario::{RunStatus, ScenarioRunner, ScenarioSpec, ScenarioState};
use timeout_harness::transfer::RatePlan;
use timeout_harness::{HarnessError, ProfileRegistry};

use common::{closed_addr, fast_profiles, stalled_endpoint, start_mock_endpoint, CHUNK, SLOW_CHUNKS};

fn runner(base_url: &str, scenarios: Vec<ScenarioSpec>) -> ScenarioRunner {
    let registry = ProfileRegistry::new(fast_profiles()).unwrap();
    let gateway = EndpointGateway::new(base_url).unwrap();
    ScenarioRunner::new(Arc::new(registry), gateway, scenarios)
}

fn slow_download(id: &str, profile: &str, expected: OutcomeKind) -> ScenarioSpec {
    ScenarioSpec::new(id, profile, Route::DownloadSlowServer, expected)
        .with_delay(Duration::from_millis(1_000))
}

#[tokio::test]
async fn test_read_budget_below_server_delay_times_out() {
    let base_url = start_mock_endpoint().await;
    let sink = MemorySink::new();
    let runner = runner(
        &base_url,
        vec![slow_download("read-timeout", "fast-read", OutcomeKind::ClientReadTimeout)],
    )
    .with_sink(Arc::new(sink.clone()));

    let report = runner.run().await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    let verdict = report.verdict("read-timeout").unwrap();
    assert_eq!(verdict.actual, OutcomeKind::ClientReadTimeout);
    assert!(verdict.passed);
    assert!(verdict.detail.contains("read budget"));

    let lines = sink.lines();
    assert!(lines[0].starts_with("[PASS] read-timeout"));
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_read_budget_above_server_delay_succeeds() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new("read-ok", "patient", Route::DownloadSlowServer, OutcomeKind::Success)
            .with_delay(Duration::from_millis(200))],
    );

    let report = runner.run().await.unwrap();

    let verdict = report.verdict("read-ok").unwrap();
    assert_eq!(verdict.actual, OutcomeKind::Success);
    let transfer = verdict.transfer.unwrap();
    assert_eq!(transfer.bytes_moved, (SLOW_CHUNKS as usize * CHUNK) as u64);
    assert!(report.passed());
}

#[tokio::test]
async fn test_write_budget_below_server_read_delay_times_out() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new(
            "write-timeout",
            "fast-write",
            Route::UploadSlowServer,
            OutcomeKind::ClientWriteTimeout,
        )
        .with_delay(Duration::from_millis(2_000))
        .with_payload(32 * 1024 * 1024)],
    );

    let report = runner.run().await.unwrap();

    let verdict = report.verdict("write-timeout").unwrap();
    assert_eq!(verdict.actual, OutcomeKind::ClientWriteTimeout);
    assert!(verdict.detail.contains("write budget"));
}

#[tokio::test]
async fn test_write_budget_above_server_read_delay_succeeds() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new("write-ok", "patient", Route::UploadSlowServer, OutcomeKind::Success)
            .with_delay(Duration::from_millis(50))
            .with_payload(64 * 1024)],
    );

    let report = runner.run().await.unwrap();

    let verdict = report.verdict("write-ok").unwrap();
    assert_eq!(verdict.actual, OutcomeKind::Success);
    assert_eq!(verdict.transfer.unwrap().bytes_moved, 64 * 1024);
}

#[tokio::test]
async fn test_slow_acknowledgement_is_a_read_timeout() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new(
            "ack-timeout",
            "fast-read",
            Route::UploadSlowResponse,
            OutcomeKind::ClientReadTimeout,
        )
        .with_delay(Duration::from_millis(1_000))
        .with_payload(16 * 1024)],
    );

    let report = runner.run().await.unwrap();

    assert_eq!(
        report.verdict("ack-timeout").unwrap().actual,
        OutcomeKind::ClientReadTimeout
    );
}

#[tokio::test]
async fn test_throttled_download_moves_whole_body() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new("large", "patient", Route::DownloadLargeFile, OutcomeKind::Success)
            .with_rate(RatePlan::throttled(16 * 1024, 4, Duration::from_millis(5)))],
    );

    let report = runner.run().await.unwrap();

    let transfer = report.verdict("large").unwrap().transfer.unwrap();
    assert_eq!(transfer.bytes_moved, 256 * CHUNK as u64);
    assert_eq!(transfer.chunks_moved, 16);
}

#[tokio::test]
async fn test_server_rejection_is_unclassified() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![ScenarioSpec::new(
            "server-read-timeout",
            "patient",
            Route::UploadExpectFastClient,
            OutcomeKind::Unclassified,
        )
        .with_payload(8 * 1024)
        .with_rate(RatePlan::throttled(1024, 1, Duration::from_millis(500)))],
    );

    let report = runner.run().await.unwrap();

    let verdict = report.verdict("server-read-timeout").unwrap();
    assert_eq!(verdict.actual, OutcomeKind::Unclassified);
    assert!(verdict.detail.contains("not attributable"));
}

#[tokio::test]
async fn test_unreachable_endpoint_skips_every_scenario() {
    let base_url = format!("http://{}", closed_addr());
    let sink = MemorySink::new();
    let runner = runner(
        &base_url,
        vec![
            slow_download("first", "fast-read", OutcomeKind::ClientReadTimeout),
            slow_download("second", "patient", OutcomeKind::Success),
        ],
    )
    .with_sink(Arc::new(sink.clone()));

    let report = runner.run().await.unwrap();

    assert!(matches!(report.status, RunStatus::ServerUnreachable { .. }));
    assert_eq!(report.verdicts.len(), 2);
    for verdict in &report.verdicts {
        assert_eq!(verdict.state, ScenarioState::Aborted);
        assert!(verdict.detail.contains("skipped-precondition"));
    }
    assert!(!report.passed());
    assert!(sink.lines()[0].starts_with("[ABORT] first"));
    assert!(!runner.registry().is_materialized("fast-read"));
}

#[tokio::test]
async fn test_unknown_profile_fails_before_network() {
    let base_url = format!("http://{}", closed_addr());
    let runner = runner(
        &base_url,
        vec![slow_download("ghost", "nonexistent", OutcomeKind::Success)],
    );

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, HarnessError::UnknownProfile(ref name) if name == "nonexistent"));

    let err = runner.registry().get("nonexistent").await.unwrap_err();
    assert!(matches!(err, HarnessError::UnknownProfile(_)));
}

#[tokio::test]
async fn test_repeated_runs_agree() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![slow_download("repeat", "fast-read", OutcomeKind::ClientReadTimeout)],
    );

    let first = runner.run().await.unwrap();
    let second = runner.run().await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(
        first.verdict("repeat").unwrap().actual,
        second.verdict("repeat").unwrap().actual
    );
}

#[tokio::test]
async fn test_only_requested_profiles_are_built() {
    let base_url = start_mock_endpoint().await;
    let runner = runner(
        &base_url,
        vec![slow_download("read-timeout", "fast-read", OutcomeKind::ClientReadTimeout)],
    );

    runner.run().await.unwrap();

    assert!(runner.registry().is_materialized("fast-read"));
    assert!(runner.registry().is_materialized("normal"));
    assert!(!runner.registry().is_materialized("fast-write"));
}

#[tokio::test]
async fn test_cancellation_mid_scenario() {
    let base_url = start_mock_endpoint().await;
    let shutdown = Arc::new(Shutdown::new());
    let runner = runner(
        &base_url,
        vec![
            slow_download("long", "patient", OutcomeKind::Success).with_delay(Duration::from_millis(2_000)),
            slow_download("never", "patient", OutcomeKind::Success),
        ],
    )
    .with_shutdown(shutdown.subscribe());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.trigger();
    });

    let started = std::time::Instant::now();
    let report = runner.run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.verdicts.len(), 2);
    assert!(report
        .verdicts
        .iter()
        .all(|v| v.state == ScenarioState::Aborted));
    assert!(report.verdict("long").unwrap().detail.contains("mid-scenario"));
}

#[tokio::test]
async fn test_refused_connection_is_connect_failure() {
    let gateway = EndpointGateway::new(&format!("http://{}", closed_addr())).unwrap();
    let registry = ProfileRegistry::new(fast_profiles()).unwrap();
    let client = registry.get("patient").await.unwrap();

    let err = match gateway.download(&client, Route::DownloadLargeFile, None).await {
        Ok(_) => panic!("download against a closed port succeeded"),
        Err(err) => err,
    };

    assert_eq!(classify(&Err(Failure::read(err))), OutcomeKind::ConnectFailure);
}

#[tokio::test]
async fn test_runner_from_config_respects_only() {
    let base_url = start_mock_endpoint().await;
    let mut config = HarnessConfig::default();
    config.target.base_url = base_url;
    config.run.only = vec!["client-read-timeout".into(), "client-read-ok".into()];

    let runner = ScenarioRunner::from_config(&config).unwrap();
    let ids: Vec<_> = runner.scenarios().iter().map(|s| s.id.as_str()).collect();

    assert_eq!(ids, vec!["client-read-timeout", "client-read-ok"]);
    assert!(runner.registry().contains("short-read"));
}

#[tokio::test]
async fn test_stalled_dial_download_is_connect_failure() {
    let endpoint = stalled_endpoint().await;
    let runner = runner(&endpoint.base_url, Vec::new());
    let spec = ScenarioSpec::new("dial", "slow-dial-read", Route::DownloadLargeFile, OutcomeKind::ConnectFailure);
    let client = runner.registry().get("slow-dial-read").await.unwrap();

    let started = std::time::Instant::now();
    let result = runner.execute(&spec, &client).await;

    assert_eq!(classify(&result), OutcomeKind::ConnectFailure);
    // Gave up on the connect budget, not the 300ms read budget.
    assert!(started.elapsed() >= Duration::from_millis(1_000));
}

#[tokio::test]
async fn test_stalled_dial_upload_is_connect_failure() {
    let endpoint = stalled_endpoint().await;
    let runner = runner(&endpoint.base_url, Vec::new());
    let spec = ScenarioSpec::new("dial", "slow-dial-write", Route::UploadNormal, OutcomeKind::ConnectFailure)
        .with_payload(64 * 1024);
    let client = runner.registry().get("slow-dial-write").await.unwrap();

    let started = std::time::Instant::now();
    let result = runner.execute(&spec, &client).await;

    assert_eq!(classify(&result), OutcomeKind::ConnectFailure);
    assert!(started.elapsed() >= Duration::from_millis(1_000));
}

#[tokio::test]
async fn test_cancellation_during_ping() {
    let endpoint = stalled_endpoint().await;
    let shutdown = Arc::new(Shutdown::new());
    let runner = runner(
        &endpoint.base_url,
        vec![slow_download("never", "patient", OutcomeKind::Success)],
    )
    .with_ping_profile("slow-dial")
    .with_shutdown(shutdown.subscribe());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.trigger();
    });

    let started = std::time::Instant::now();
    let report = runner.run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].state, ScenarioState::Aborted);
}
