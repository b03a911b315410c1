//! Response body stream with a per-chunk read budget.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::gateway::TransportError;

/// Chunks of a response body. Each pull may wait at most the read budget.
pub type DownloadStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Wrap a body stream so that every `next()` is bounded by `budget`.
///
/// The timer only runs while the consumer is waiting, so a consumer that
/// sleeps between pulls does not eat into its own budget.
pub fn with_read_budget<S>(body: S, budget: Duration) -> DownloadStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    stream::unfold(Some(Box::pin(body)), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(budget, body.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
            Ok(Some(Err(e))) => Some((Err(TransportError::Http(e)), None)),
            Ok(None) => None,
            Err(_) => Some((Err(TransportError::budget_elapsed("read", budget)), None)),
        }
    })
    .boxed()
}
