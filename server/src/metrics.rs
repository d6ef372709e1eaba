// Stream accounting for the /metrics endpoint

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters shared by all in-flight requests.
#[derive(Debug)]
pub struct StreamMetrics {
    started_at: Instant,
    requests: AtomicU64,
    active_streams: AtomicU64,
    completed_streams: AtomicU64,
    aborted_streams: AtomicU64,
    bytes_streamed: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            active_streams: AtomicU64::new(0),
            completed_streams: AtomicU64::new(0),
            aborted_streams: AtomicU64::new(0),
            bytes_streamed: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Open a stream accounting scope. The returned guard must live inside
    /// the response body stream so that a dropped connection is observed.
    pub fn begin_stream(self: &Arc<Self>) -> StreamGuard {
        self.active_streams.fetch_add(1, Ordering::Relaxed);
        StreamGuard {
            metrics: Arc::clone(self),
            finished: false,
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn active_streams(&self) -> u64 {
        self.active_streams.load(Ordering::Relaxed)
    }

    pub fn completed_streams(&self) -> u64 {
        self.completed_streams.load(Ordering::Relaxed)
    }

    pub fn aborted_streams(&self) -> u64 {
        self.aborted_streams.load(Ordering::Relaxed)
    }

    pub fn bytes_streamed(&self) -> u64 {
        self.bytes_streamed.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for StreamMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Accounting scope for one response stream.
///
/// Dropping the guard without `complete()` counts the stream as aborted:
/// the client went away or the engine failed mid-stream.
#[derive(Debug)]
pub struct StreamGuard {
    metrics: Arc<StreamMetrics>,
    finished: bool,
}

impl StreamGuard {
    pub fn add_bytes(&self, n: u64) {
        self.metrics.bytes_streamed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn complete(mut self) {
        self.finished = true;
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.metrics.active_streams.fetch_sub(1, Ordering::Relaxed);
        if self.finished {
            self.metrics.completed_streams.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.aborted_streams.fetch_add(1, Ordering::Relaxed);
        }
    }
}
