//! Pass-through body streaming.
//!
//! # Responsibilities
//! - Forward upstream chunks downstream in arrival order, unbuffered
//! - Abort the transfer when the upstream errors or stalls
//! - Release the upstream connection as soon as the downstream goes away
//!
//! # Design Decisions
//! - Cancellation is drop-based: when the client disconnects the server
//!   drops the response body, which drops the upstream response and closes
//!   its connection
//! - A [`TransferGuard`] travels with the stream and reports how the
//!   transfer ended, including the drop case

use std::pin::Pin;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use futures_util::{stream, Stream, StreamExt};
use url::Url;

use crate::observability::metrics;
use crate::relay::error::RelayError;

/// How a body transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    /// Upstream body fully forwarded.
    Completed,
    /// Upstream failed or stalled after headers were sent.
    Failed,
    /// Downstream went away first.
    Aborted,
}

impl TransferResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferResult::Completed => "completed",
            TransferResult::Failed => "failed",
            TransferResult::Aborted => "aborted",
        }
    }
}

/// Tracks one body transfer and reports it when dropped.
#[derive(Debug)]
pub struct TransferGuard {
    url: Url,
    started: Instant,
    bytes: u64,
    result: Option<TransferResult>,
}

impl TransferGuard {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            started: Instant::now(),
            bytes: 0,
            result: None,
        }
    }

    fn record(&mut self, chunk: &Bytes) {
        self.bytes += chunk.len() as u64;
    }

    fn finish(&mut self, result: TransferResult) {
        self.result = Some(result);
    }
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        let result = self.result.unwrap_or(TransferResult::Aborted);
        let elapsed = self.started.elapsed();
        match result {
            TransferResult::Completed => tracing::debug!(
                upstream = %self.url,
                bytes = self.bytes,
                elapsed = ?elapsed,
                "Transfer completed"
            ),
            TransferResult::Failed => tracing::warn!(
                upstream = %self.url,
                bytes = self.bytes,
                elapsed = ?elapsed,
                "Transfer failed mid-stream"
            ),
            TransferResult::Aborted => tracing::debug!(
                upstream = %self.url,
                bytes = self.bytes,
                elapsed = ?elapsed,
                "Downstream closed early, upstream released"
            ),
        }
        metrics::record_transfer(result.as_str(), self.bytes);
    }
}

struct Transfer<S> {
    upstream: Pin<Box<S>>,
    guard: TransferGuard,
}

/// Wrap an upstream byte stream so it is forwarded chunk by chunk.
///
/// The returned stream ends after the first error; the server then aborts
/// the connection, which the client observes as a truncated body.
pub fn relay_stream<S>(
    upstream: S,
    idle_timeout: Duration,
    guard: TransferGuard,
) -> impl Stream<Item = Result<Bytes, RelayError>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = Some(Transfer {
        upstream: Box::pin(upstream),
        guard,
    });

    stream::unfold(state, move |state| async move {
        let Some(mut transfer) = state else {
            return None;
        };
        match tokio::time::timeout(idle_timeout, transfer.upstream.next()).await {
            Ok(Some(Ok(chunk))) => {
                transfer.guard.record(&chunk);
                Some((Ok(chunk), Some(transfer)))
            }
            Ok(Some(Err(e))) => {
                transfer.guard.finish(TransferResult::Failed);
                Some((Err(RelayError::MidStreamFailure(e)), None))
            }
            Ok(None) => {
                transfer.guard.finish(TransferResult::Completed);
                None
            }
            Err(_) => {
                transfer.guard.finish(TransferResult::Failed);
                Some((Err(RelayError::StreamStalled(idle_timeout)), None))
            }
        }
    })
}

/// Response body streaming `upstream` through [`relay_stream`].
pub fn relay_body<S>(upstream: S, idle_timeout: Duration, guard: TransferGuard) -> Body
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    Body::from_stream(relay_stream(upstream, idle_timeout, guard))
}
