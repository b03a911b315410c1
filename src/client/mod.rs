//! Client profiles and their lazily built HTTP clients.
//!
//! # Data Flow
//! ```text
//! ProfileConfig (TOML) / built-ins
//!     → profile.rs (ClientProfile + TimeoutBudget, immutable)
//!     → registry.rs (one slot per profile name)
//!     → get(name): first caller builds reqwest::Client, later callers share it
//! ```
//!
//! # Design Decisions
//! - Budgets are fixed once a profile is registered
//! - Construction is per-slot, so building one profile never blocks another
//! - Clients keep no idle connections; each scenario dials fresh
//! - connect.rs reports each established connection so the gateway can start
//!   read/write budgets only after the connect phase

pub mod connect;
pub mod profile;
pub mod registry;

pub use profile::{ClientProfile, TimeoutBudget};
pub use registry::{HarnessClient, ProfileRegistry};
