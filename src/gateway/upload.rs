//! Streaming upload plumbing.
//!
//! # Responsibilities
//! - Feed the request body from a bounded channel
//! - Hold the write budget until the transport first asks for body bytes,
//!   which only happens once the connection is up
//! - Enforce the write budget on every chunk handed to the transport
//! - Run the request in the background and bound the acknowledgement wait
//!   by the read budget
//!
//! # Design Decisions
//! - Channel capacity is one chunk, so a stalled socket stalls the sender
//!   almost immediately instead of queueing the whole payload in memory
//! - Dropping a `PendingUpload` aborts the request and closes the connection

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

use crate::client::HarnessClient;
use crate::gateway::{check_status, TransportError};
use crate::transfer::ChunkSink;

/// Write half of an in-flight upload.
pub struct BodySink {
    tx: mpsc::Sender<Bytes>,
    write_budget: Duration,
    connect_budget: Duration,
    /// Fires when the transport first polls the body; `None` once seen.
    pulling: Option<oneshot::Receiver<()>>,
}

impl BodySink {
    /// Wait, within the connect budget, until the transport starts pulling.
    async fn await_connection(&mut self) -> Result<(), TransportError> {
        let Some(pulling) = self.pulling.take() else {
            return Ok(());
        };
        match tokio::time::timeout(self.connect_budget, pulling).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::ConnectElapsed(self.connect_budget)),
        }
    }
}

impl ChunkSink for BodySink {
    type Error = TransportError;

    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), TransportError> {
        self.await_connection().await?;
        match tokio::time::timeout(self.write_budget, self.tx.send(chunk)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::budget_elapsed("write", self.write_budget)),
        }
    }
}

struct AbortOnDrop(JoinHandle<Result<String, TransportError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// An upload whose request is running and whose body is still open.
pub struct PendingUpload {
    sink: BodySink,
    ack: AbortOnDrop,
    read_budget: Duration,
}

impl PendingUpload {
    pub(crate) fn start(client: &HarnessClient, url: Url) -> Self {
        let (tx, rx) = mpsc::channel::<Bytes>(1);
        let (pulled, pulling) = oneshot::channel();
        let body = stream::unfold((rx, Some(pulled)), |(mut rx, mut pulled)| async move {
            if let Some(pulled) = pulled.take() {
                let _ = pulled.send(());
            }
            rx.recv()
                .await
                .map(|chunk| (Ok::<_, io::Error>(chunk), (rx, pulled)))
        });

        let request = client
            .http()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(body));

        let ack = tokio::spawn(async move {
            let response = request.send().await?;
            let response = check_status(response)?;
            Ok(response.text().await?)
        });

        let budget = client.budget();
        Self {
            sink: BodySink {
                tx,
                write_budget: budget.write,
                connect_budget: budget.connect,
                pulling: Some(pulling),
            },
            ack: AbortOnDrop(ack),
            read_budget: budget.read,
        }
    }

    pub fn sink(&mut self) -> &mut BodySink {
        &mut self.sink
    }

    /// Close the body and wait for the server's acknowledgement.
    pub async fn acknowledge(self) -> Result<String, TransportError> {
        let PendingUpload {
            sink,
            mut ack,
            read_budget,
        } = self;
        drop(sink);

        match tokio::time::timeout(read_budget, &mut ack.0).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::budget_elapsed("read", read_budget)),
        }
    }

    /// Why the transport stopped pulling the body, once the sink reports `Closed`.
    pub async fn into_failure(self) -> Option<TransportError> {
        let PendingUpload {
            sink,
            mut ack,
            read_budget,
        } = self;
        drop(sink);

        match tokio::time::timeout(read_budget, &mut ack.0).await {
            Ok(Ok(Err(e))) => Some(e),
            _ => None,
        }
    }
}
