//! Typed façade over the external endpoint's routes.
//!
//! # Data Flow
//! ```text
//! ping(client)                 → GET /api/ping → acknowledgement or ServerUnreachable
//! download(client, route, hint) → GET route?param=hint → DownloadStream (read budget per chunk)
//! upload(client, route, hint)   → POST route?param=hint → PendingUpload { BodySink, ack task }
//! ```
//!
//! # Design Decisions
//! - No retries, no redirects to interpret; one request per call
//! - The delay hint is only a query parameter; the server decides what to do with it
//! - Read/write budgets are applied here, per chunk, so the error surfaces in
//!   the transfer phase that was actually in flight
//! - Neither budget runs while the connection is still being dialed; a stalled
//!   dial ends as `ConnectElapsed` or reqwest's own connect error

pub mod download;
pub mod routes;
pub mod upload;

use std::io;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::client::HarnessClient;
use crate::error::{HarnessError, HarnessResult};

pub use download::DownloadStream;
pub use routes::{Direction, Route};
pub use upload::{BodySink, PendingUpload};

/// Errors raised while talking to the endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("endpoint returned status {0}")]
    Status(StatusCode),

    /// The request body channel closed before the payload was handed over.
    #[error("request body closed by transport")]
    Closed,

    /// No connection was established within the connect budget.
    #[error("connection not established within {0:?}")]
    ConnectElapsed(Duration),

    /// A route was used against the wrong operation.
    #[error("route {0} does not support this operation")]
    Misrouted(Route),
}

impl TransportError {
    /// A timeout raised by one of the harness's own budgets.
    pub(crate) fn budget_elapsed(which: &str, budget: Duration) -> Self {
        TransportError::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{} budget of {:?} elapsed", which, budget),
        ))
    }
}

/// Gateway bound to one base URL.
#[derive(Debug, Clone)]
pub struct EndpointGateway {
    base_url: Url,
}

impl EndpointGateway {
    pub fn new(base_url: &str) -> HarnessResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| HarnessError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HarnessError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        Ok(Self { base_url: parsed })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for `route`, with the delay hint (or its default) as a query parameter.
    ///
    /// Any path on the base URL is kept as a prefix.
    pub fn url_for(&self, route: Route, hint: Option<Duration>) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}{}", self.base_url.path().trim_end_matches('/'), route.path());
        url.set_path(&path);
        url.set_query(None);

        if let (Some((param, _)), Some(delay)) = (route.delay_param(), route.effective_delay(hint)) {
            url.query_pairs_mut()
                .append_pair(param, &delay.as_millis().to_string());
        }
        url
    }

    /// Baseline reachability check, bounded by the client's read budget.
    pub async fn ping(&self, client: &HarnessClient) -> HarnessResult<String> {
        let url = self.url_for(Route::Ping, None);
        let budget = client.budget().read;

        let attempt = async {
            let response = client.http().get(url.clone()).send().await?;
            let response = check_status(response)?;
            Ok::<_, TransportError>(response.text().await?)
        };

        let outcome = match tokio::time::timeout(budget, attempt).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::budget_elapsed("read", budget)),
        };

        outcome.map_err(|source| HarnessError::ServerUnreachable {
            base_url: self.base_url.to_string(),
            source,
        })
    }

    /// Start a download and hand back its body as a budgeted chunk stream.
    pub async fn download(
        &self,
        client: &HarnessClient,
        route: Route,
        hint: Option<Duration>,
    ) -> Result<DownloadStream, TransportError> {
        if route.direction() != Direction::Download {
            return Err(TransportError::Misrouted(route));
        }

        let url = self.url_for(route, hint);
        let budget = client.budget();
        tracing::debug!(url = %url, profile = client.profile_name(), "Starting download");

        let mut connected = client.connect_events().subscribe();
        let send = client.http().get(url).send();
        tokio::pin!(send);

        // The read budget starts once the connection is up; until then only
        // the connect budget applies.
        let early = tokio::select! {
            biased;
            result = &mut send => Some(result?),
            established = tokio::time::timeout(budget.connect, connected.changed()) => {
                if established.is_err() {
                    return Err(TransportError::ConnectElapsed(budget.connect));
                }
                None
            }
        };

        let response = match early {
            Some(response) => response,
            None => match tokio::time::timeout(budget.read, &mut send).await {
                Ok(result) => result?,
                Err(_) => return Err(TransportError::budget_elapsed("read", budget.read)),
            },
        };
        let response = check_status(response)?;

        Ok(download::with_read_budget(response.bytes_stream(), budget.read))
    }

    /// Open an upload. The request runs in the background, pulling chunks
    /// from the returned sink.
    pub fn upload(
        &self,
        client: &HarnessClient,
        route: Route,
        hint: Option<Duration>,
    ) -> Result<PendingUpload, TransportError> {
        if route.direction() != Direction::Upload {
            return Err(TransportError::Misrouted(route));
        }

        let url = self.url_for(route, hint);
        tracing::debug!(url = %url, profile = client.profile_name(), "Starting upload");
        Ok(PendingUpload::start(client, url))
    }
}

pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransportError::Status(status))
    }
}
