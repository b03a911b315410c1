//! HTTP Timeout Scenario Harness Library
//!
//! Reproduces and verifies the ways a client/server HTTP exchange can stall:
//! client read timeout, client write timeout, and (best effort) the server's
//! own read and write timeouts.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod outcome;
pub mod scenario;
pub mod transfer;

pub use client::{ClientProfile, ProfileRegistry, TimeoutBudget};
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use gateway::{EndpointGateway, Route};
pub use lifecycle::Shutdown;
pub use outcome::OutcomeKind;
pub use scenario::{RunReport, ScenarioRunner, ScenarioSpec, Verdict};
