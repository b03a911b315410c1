//! Connection-established notifications from reqwest's connector stack.
//!
//! reqwest does not say when a request's TCP (and TLS) connection is up. The
//! gateway needs that moment to start the read budget, so each client's
//! connector is wrapped in a layer that bumps a counter on every successful
//! connect. Callers subscribe before sending and wait for the next change.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tower::{Layer, Service};

/// Shared counter of connections established by one client.
#[derive(Debug, Clone)]
pub struct ConnectEvents {
    tx: Arc<watch::Sender<u64>>,
}

impl ConnectEvents {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that fires on the next connection after this call.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Connections established so far.
    pub fn count(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn layer(&self) -> ConnectNotifyLayer {
        ConnectNotifyLayer {
            events: self.clone(),
        }
    }

    fn established(&self) {
        self.tx.send_modify(|n| *n += 1);
    }
}

impl Default for ConnectEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ConnectNotifyLayer {
    events: ConnectEvents,
}

impl<S> Layer<S> for ConnectNotifyLayer {
    type Service = ConnectNotify<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConnectNotify {
            inner,
            events: self.events.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ConnectNotify<S> {
    inner: S,
    events: ConnectEvents,
}

impl<S, R> Service<R> for ConnectNotify<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let connecting = self.inner.call(req);
        let events = self.events.clone();
        Box::pin(async move {
            let conn = connecting.await?;
            events.established();
            Ok(conn)
        })
    }
}
