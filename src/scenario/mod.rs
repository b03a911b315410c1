//! Scenario definitions, execution and verdicts.
//!
//! # Data Flow
//! ```text
//! ScenarioSpec list (built-in or TOML)
//!     → runner.rs: resolve profile → gateway call → rate-controlled transfer
//!     → outcome::classify
//!     → verdict.rs: compare with expectation, explain, append to RunReport + sink
//! ```

pub mod runner;
pub mod spec;
pub mod verdict;

pub use runner::ScenarioRunner;
pub use spec::{default_scenarios, Reproducibility, ScenarioSpec};
pub use verdict::{RunReport, RunStatus, ScenarioState, Verdict};
