//! Rate-controlled streaming transfer.
//!
//! Moves bytes chunk by chunk and, after every Nth chunk, sleeps on the same
//! task before touching the transport again. A paused download stops pulling
//! from the socket and a paused upload stops feeding it, so the server sees a
//! genuinely slow peer.
//!
//! Both directions apply the same rule: every Nth chunk is followed by a
//! sleep, the final chunk included (even a short trailing one), and that sleep
//! is part of `elapsed`. The transfer cannot tell a download's last chunk
//! apart before pulling again, so uploads do not special-case it either.
//!
//! Errors from the source or sink are returned untouched. Deciding whether an
//! error was a timeout is the classifier's job.

use std::future::Future;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Default chunk size for both directions.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// How fast the application side consumes or produces bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatePlan {
    /// Bytes per chunk.
    pub chunk_size: usize,
    /// Sleep after every this many chunks; 0 never sleeps.
    pub sleep_every: u32,
    /// Length of each sleep in milliseconds.
    pub sleep_ms: u64,
}

impl RatePlan {
    /// Full speed, default chunk size.
    pub fn unthrottled() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sleep_every: 0,
            sleep_ms: 0,
        }
    }

    pub fn throttled(chunk_size: usize, sleep_every: u32, sleep: Duration) -> Self {
        Self {
            chunk_size,
            sleep_every,
            sleep_ms: sleep.as_millis() as u64,
        }
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }

    fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    fn sleeps_after(&self, chunks: u32) -> bool {
        self.sleep_every > 0 && self.sleep_ms > 0 && chunks % self.sleep_every == 0
    }
}

impl Default for RatePlan {
    fn default() -> Self {
        Self::unthrottled()
    }
}

/// Counters for a transfer that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub bytes_moved: u64,
    pub chunks_moved: u32,
    pub elapsed: Duration,
}

/// Destination for upload chunks.
pub trait ChunkSink {
    type Error;

    /// Hand one chunk to the transport.
    fn write_chunk(&mut self, chunk: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

struct ChunkMeter<'a> {
    plan: &'a RatePlan,
    started: Instant,
    bytes: u64,
    chunks: u32,
    /// Bytes in the current, not yet complete, download chunk.
    fill: usize,
}

impl<'a> ChunkMeter<'a> {
    fn new(plan: &'a RatePlan) -> Self {
        Self {
            plan,
            started: Instant::now(),
            bytes: 0,
            chunks: 0,
            fill: 0,
        }
    }

    async fn chunk_done(&mut self) {
        self.chunks += 1;
        if self.plan.sleeps_after(self.chunks) {
            tracing::trace!(chunks = self.chunks, sleep_ms = self.plan.sleep_ms, "Pacing transfer");
            tokio::time::sleep(self.plan.sleep()).await;
        }
    }

    /// Account for `len` downloaded bytes, cutting them into fixed-size chunks.
    async fn absorb(&mut self, mut len: usize) {
        let chunk_size = self.plan.effective_chunk_size();
        self.bytes += len as u64;
        while len > 0 {
            let take = (chunk_size - self.fill).min(len);
            self.fill += take;
            len -= take;
            if self.fill == chunk_size {
                self.fill = 0;
                self.chunk_done().await;
            }
        }
    }

    async fn finish(mut self) -> TransferResult {
        if self.fill > 0 {
            self.fill = 0;
            self.chunk_done().await;
        }
        TransferResult {
            bytes_moved: self.bytes,
            chunks_moved: self.chunks,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Drain `source` to end of stream at the pace set by `plan`.
pub async fn download<S, B, E>(mut source: S, plan: &RatePlan) -> Result<TransferResult, E>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut meter = ChunkMeter::new(plan);
    while let Some(item) = source.next().await {
        let buf = item?;
        meter.absorb(buf.as_ref().len()).await;
    }
    Ok(meter.finish().await)
}

/// Push `payload` into `sink` at the pace set by `plan`.
pub async fn upload<K>(sink: &mut K, payload: &Bytes, plan: &RatePlan) -> Result<TransferResult, K::Error>
where
    K: ChunkSink,
{
    let chunk_size = plan.effective_chunk_size();
    let mut meter = ChunkMeter::new(plan);
    let mut offset = 0;

    while offset < payload.len() {
        let end = (offset + chunk_size).min(payload.len());
        sink.write_chunk(payload.slice(offset..end)).await?;
        meter.bytes += (end - offset) as u64;
        offset = end;
        meter.chunk_done().await;
    }
    Ok(meter.finish().await)
}
