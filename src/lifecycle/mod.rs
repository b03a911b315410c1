//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl-C (main.rs)
//!     → Shutdown::trigger
//!     → runner checks the signal before each scenario
//!     → an in-flight scenario is dropped mid-transfer, closing its connection
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
