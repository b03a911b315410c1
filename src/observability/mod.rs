//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ScenarioRunner produces:
//!     → logging.rs (structured tracing events, stderr)
//!     → metrics.rs (counters, histograms; Prometheus scrape when enabled)
//!     → sink.rs (one rendered line per verdict, in order)
//!
//! Consumers:
//!     → terminal / log aggregation
//!     → whatever presentation layer implements ResultSink
//! ```
//!
//! # Design Decisions
//! - Verdict lines go through a sink, not through the log, so a UI can
//!   subscribe without parsing logs
//! - Metrics are no-ops unless a recorder is installed

pub mod logging;
pub mod metrics;
pub mod sink;

pub use sink::{MemorySink, ResultSink, StdoutSink, TracingSink};
