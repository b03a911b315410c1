//! Outcome classification.
//!
//! # Decision Table
//! ```text
//! transfer completed                         → Success
//! connect error (refused or dial not done)   → ConnectFailure
//! timeout during Phase::Read                 → ClientReadTimeout
//! timeout during Phase::Write                → ClientWriteTimeout
//! anything else                              → Unclassified
//! ```
//!
//! The phase comes from the transfer operation that was in flight, never
//! from an error message. Symptoms are read from structured error data:
//! `reqwest::Error::is_connect`/`is_timeout` and `io::ErrorKind`, searched
//! along the `source()` chain.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::gateway::TransportError;
use crate::transfer::TransferResult;

/// The unit of comparison between expected and actual results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    ClientReadTimeout,
    ClientWriteTimeout,
    ConnectFailure,
    Unclassified,
}

impl OutcomeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "Success",
            OutcomeKind::ClientReadTimeout => "ClientReadTimeout",
            OutcomeKind::ClientWriteTimeout => "ClientWriteTimeout",
            OutcomeKind::ConnectFailure => "ConnectFailure",
            OutcomeKind::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which side of the exchange the harness was driving when an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Waiting on response headers, body chunks or an upload acknowledgement.
    Read,
    /// Handing request body chunks to the transport.
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Read => f.write_str("read"),
            Phase::Write => f.write_str("write"),
        }
    }
}

/// A scenario error tagged with the phase it surfaced in.
#[derive(Debug)]
pub struct Failure {
    pub phase: Phase,
    pub error: TransportError,
}

impl Failure {
    pub fn read(error: TransportError) -> Self {
        Self {
            phase: Phase::Read,
            error,
        }
    }

    pub fn write(error: TransportError) -> Self {
        Self {
            phase: Phase::Write,
            error,
        }
    }

    pub fn outcome(&self) -> OutcomeKind {
        lookup(self.phase, symptom(&self.error))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} phase: {}", self.phase, self.error)
    }
}

/// What an error looks like, independent of when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symptom {
    Connect,
    Timeout,
    Other,
}

fn lookup(phase: Phase, symptom: Symptom) -> OutcomeKind {
    match (phase, symptom) {
        (_, Symptom::Connect) => OutcomeKind::ConnectFailure,
        (Phase::Read, Symptom::Timeout) => OutcomeKind::ClientReadTimeout,
        (Phase::Write, Symptom::Timeout) => OutcomeKind::ClientWriteTimeout,
        (_, Symptom::Other) => OutcomeKind::Unclassified,
    }
}

fn io_symptom(kind: io::ErrorKind) -> Symptom {
    match kind {
        io::ErrorKind::TimedOut => Symptom::Timeout,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable => Symptom::Connect,
        _ => Symptom::Other,
    }
}

fn symptom(error: &TransportError) -> Symptom {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(TransportError::ConnectElapsed(_)) = err.downcast_ref::<TransportError>() {
            return Symptom::Connect;
        }
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            // A connect timeout reports both; the connect side wins.
            if http.is_connect() {
                return Symptom::Connect;
            }
            if http.is_timeout() {
                return Symptom::Timeout;
            }
        }
        if let Some(io) = err.downcast_ref::<io::Error>() {
            let found = io_symptom(io.kind());
            if found != Symptom::Other {
                return found;
            }
            // io::Error::source skips the wrapped error itself.
            if let Some(inner) = io.get_ref() {
                let inner: &(dyn StdError + 'static) = inner;
                current = Some(inner);
                continue;
            }
        }
        current = err.source();
    }
    Symptom::Other
}

/// Map a scenario's result onto an `OutcomeKind`.
pub fn classify(result: &Result<TransferResult, Failure>) -> OutcomeKind {
    match result {
        Ok(_) => OutcomeKind::Success,
        Err(failure) => failure.outcome(),
    }
}
