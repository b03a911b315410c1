//! Verdicts and run reports.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::client::TimeoutBudget;
use crate::outcome::{Failure, OutcomeKind};
use crate::scenario::spec::{Reproducibility, ScenarioSpec};
use crate::transfer::TransferResult;

/// Reason recorded for scenarios skipped after a failed precondition.
pub const SKIPPED_PRECONDITION: &str = "skipped-precondition";

/// Per-scenario state machine: Pending → Running → Completed | Aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioState {
    Pending,
    Running,
    Completed,
    Aborted,
}

impl ScenarioState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScenarioState::Completed | ScenarioState::Aborted)
    }
}

/// Recorded comparison of expected vs. actual outcome for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub scenario: String,
    pub state: ScenarioState,
    pub expected: OutcomeKind,
    pub actual: OutcomeKind,
    pub passed: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferResult>,
}

impl Verdict {
    /// Verdict for a scenario that ran to a result.
    pub fn completed(
        spec: &ScenarioSpec,
        budget: &TimeoutBudget,
        result: &Result<TransferResult, Failure>,
        actual: OutcomeKind,
    ) -> Self {
        Self {
            scenario: spec.id.clone(),
            state: ScenarioState::Completed,
            expected: spec.expected,
            actual,
            passed: actual == spec.expected,
            detail: explain(spec, budget, result, actual),
            transfer: result.as_ref().ok().copied(),
        }
    }

    /// Verdict for a scenario that never reached a result.
    pub fn aborted(spec: &ScenarioSpec, reason: impl Into<String>) -> Self {
        Self {
            scenario: spec.id.clone(),
            state: ScenarioState::Aborted,
            expected: spec.expected,
            actual: OutcomeKind::Unclassified,
            passed: false,
            detail: reason.into(),
            transfer: None,
        }
    }

    /// One line: status, id, expected vs. actual, and the causal explanation.
    pub fn render(&self) -> String {
        let status = match (self.state, self.passed) {
            (ScenarioState::Aborted, _) => "ABORT",
            (_, true) => "PASS",
            (_, false) => "FAIL",
        };
        format!(
            "[{}] {} expected={} actual={} :: {}",
            status, self.scenario, self.expected, self.actual, self.detail
        )
    }
}

fn fmt_delay(delay: Option<Duration>) -> String {
    match delay {
        Some(d) => format!("{:?}", d),
        None => "none".to_string(),
    }
}

/// Causal explanation: which side gave up, and which budget lost to which delay.
fn explain(
    spec: &ScenarioSpec,
    budget: &TimeoutBudget,
    result: &Result<TransferResult, Failure>,
    actual: OutcomeKind,
) -> String {
    let delay = fmt_delay(spec.effective_delay());
    let mut detail = match (actual, result) {
        (_, Ok(transfer)) => format!(
            "moved {} bytes in {} chunks over {:.2?}; read budget {:?} / write budget {:?} covered server delay {}",
            transfer.bytes_moved,
            transfer.chunks_moved,
            transfer.elapsed,
            budget.read,
            budget.write,
            delay
        ),
        (OutcomeKind::ClientReadTimeout, Err(failure)) => format!(
            "client gave up waiting for the server: read budget {:?} < server delay {} ({})",
            budget.read, delay, failure
        ),
        (OutcomeKind::ClientWriteTimeout, Err(failure)) => format!(
            "client gave up pushing the request: server stopped reading for {} > write budget {:?} ({})",
            delay, budget.write, failure
        ),
        (OutcomeKind::ConnectFailure, Err(failure)) => format!(
            "no connection within connect budget {:?} ({})",
            budget.connect, failure
        ),
        (_, Err(failure)) => format!("not attributable to a client budget ({})", failure),
    };

    if spec.reproducibility == Reproducibility::BestEffort {
        detail.push_str(
            "; best-effort: the server-side budget and kernel socket buffering decide this outcome, not the client",
        );
    }
    detail
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunStatus {
    Completed,
    ServerUnreachable { reason: String },
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::ServerUnreachable { reason } => write!(f, "server unreachable: {}", reason),
            RunStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Ordered verdict log for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub base_url: String,
    pub status: RunStatus,
    pub verdicts: Vec<Verdict>,
}

impl RunReport {
    /// True only for a completed run with no failed verdict.
    pub fn passed(&self) -> bool {
        self.status == RunStatus::Completed && self.verdicts.iter().all(|v| v.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }

    pub fn verdict(&self, scenario: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.scenario == scenario)
    }

    pub fn summary(&self) -> String {
        let passed = self.verdicts.iter().filter(|v| v.passed).count();
        format!(
            "run {} {}: {}/{} scenarios passed",
            self.run_id,
            self.status,
            passed,
            self.verdicts.len()
        )
    }
}
