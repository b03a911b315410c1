//! Routes exposed by the external timeout endpoint.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which way the payload flows for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Reachability check, no payload.
    Probe,
    /// Response body streams to the client.
    Download,
    /// Request body streams to the server.
    Upload,
}

/// One route of the external endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Ping,
    DownloadSlowServer,
    DownloadLargeFile,
    DownloadExpectSlowClient,
    DownloadServerWriteTimeout,
    UploadSlowServer,
    UploadSlowResponse,
    UploadNormal,
    UploadExpectFastClient,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Ping,
        Route::DownloadSlowServer,
        Route::DownloadLargeFile,
        Route::DownloadExpectSlowClient,
        Route::DownloadServerWriteTimeout,
        Route::UploadSlowServer,
        Route::UploadSlowResponse,
        Route::UploadNormal,
        Route::UploadExpectFastClient,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Ping => "/api/ping",
            Route::DownloadSlowServer => "/api/download/slow-server",
            Route::DownloadLargeFile => "/api/download/large-file",
            Route::DownloadExpectSlowClient => "/api/download/expect-slow-client",
            Route::DownloadServerWriteTimeout => "/api/download/test-server-write-timeout",
            Route::UploadSlowServer => "/api/upload/slow-server",
            Route::UploadSlowResponse => "/api/upload/slow-response",
            Route::UploadNormal => "/api/upload/normal",
            Route::UploadExpectFastClient => "/api/upload/expect-fast-client",
        }
    }

    pub const fn direction(self) -> Direction {
        match self {
            Route::Ping => Direction::Probe,
            Route::DownloadSlowServer
            | Route::DownloadLargeFile
            | Route::DownloadExpectSlowClient
            | Route::DownloadServerWriteTimeout => Direction::Download,
            Route::UploadSlowServer
            | Route::UploadSlowResponse
            | Route::UploadNormal
            | Route::UploadExpectFastClient => Direction::Upload,
        }
    }

    /// Query parameter carrying the server delay hint, with its default in milliseconds.
    pub const fn delay_param(self) -> Option<(&'static str, u64)> {
        match self {
            Route::DownloadSlowServer => Some(("delayBetweenChunks", 6_000)),
            Route::UploadSlowServer => Some(("delayBetweenReads", 6_000)),
            Route::UploadSlowResponse => Some(("delayBeforeResponse", 8_000)),
            _ => None,
        }
    }

    /// Delay the server applies: the hint if given, else the route default.
    pub fn effective_delay(self, hint: Option<Duration>) -> Option<Duration> {
        let (_, default_ms) = self.delay_param()?;
        Some(hint.unwrap_or(Duration::from_millis(default_ms)))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
