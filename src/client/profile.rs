//! Timeout budgets and named client profiles.

use std::time::Duration;

use crate::config::schema::ProfileConfig;

/// Built-in profile names used by the default scenario list.
pub const SHORT_READ: &str = "short-read";
pub const LONG: &str = "long";
pub const SHORT_WRITE: &str = "short-write";
pub const NORMAL: &str = "normal";

/// Independent connect/read/write budgets for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    /// Time allowed to establish the TCP (and TLS) connection.
    pub connect: Duration,
    /// Time allowed between consecutive response bytes.
    pub read: Duration,
    /// Time allowed for the transport to accept the next request chunk.
    pub write: Duration,
}

impl TimeoutBudget {
    pub fn from_millis(connect_ms: u64, read_ms: u64, write_ms: u64) -> Self {
        Self {
            connect: Duration::from_millis(connect_ms),
            read: Duration::from_millis(read_ms),
            write: Duration::from_millis(write_ms),
        }
    }

    /// Name of the first zero budget, if any.
    pub fn zero_field(&self) -> Option<&'static str> {
        if self.connect.is_zero() {
            Some("connect")
        } else if self.read.is_zero() {
            Some("read")
        } else if self.write.is_zero() {
            Some("write")
        } else {
            None
        }
    }
}

/// A named timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub name: String,
    pub budget: TimeoutBudget,
}

impl ClientProfile {
    pub fn new(name: impl Into<String>, budget: TimeoutBudget) -> Self {
        Self {
            name: name.into(),
            budget,
        }
    }

    /// The four profiles the default scenarios depend on.
    pub fn builtin() -> Vec<ClientProfile> {
        vec![
            Self::new(SHORT_READ, TimeoutBudget::from_millis(10_000, 3_000, 10_000)),
            Self::new(LONG, TimeoutBudget::from_millis(10_000, 60_000, 60_000)),
            Self::new(SHORT_WRITE, TimeoutBudget::from_millis(10_000, 30_000, 3_000)),
            Self::new(NORMAL, TimeoutBudget::from_millis(10_000, 30_000, 30_000)),
        ]
    }
}

impl From<&ProfileConfig> for ClientProfile {
    fn from(config: &ProfileConfig) -> Self {
        Self::new(
            config.name.clone(),
            TimeoutBudget::from_millis(config.connect_ms, config.read_ms, config.write_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_budgets() {
        let profiles = ClientProfile::builtin();
        let short_read = profiles.iter().find(|p| p.name == SHORT_READ).unwrap();
        assert_eq!(short_read.budget.read, Duration::from_secs(3));
        assert_eq!(short_read.budget.connect, Duration::from_secs(10));

        let short_write = profiles.iter().find(|p| p.name == SHORT_WRITE).unwrap();
        assert_eq!(short_write.budget.write, Duration::from_secs(3));
        assert_eq!(short_write.budget.read, Duration::from_secs(30));

        assert!(profiles.iter().all(|p| p.budget.zero_field().is_none()));
    }

    #[test]
    fn test_zero_field() {
        let budget = TimeoutBudget::from_millis(1, 0, 1);
        assert_eq!(budget.zero_field(), Some("read"));
    }
}
