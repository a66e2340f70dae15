//! Per-subscriber stream readers
//!
//! A reader is the delivery path for one (stream type, subscriber) pair: a
//! dedicated task subscribed to the device's broadcast channel for that
//! stream. The task serializes delivery — the callback for frame N returns
//! before frame N+1 is looked at — and checks the paused flag before each
//! delivery, so pausing takes effect before the next frame rather than
//! mid-callback. Conversion work inside the callback may block briefly
//! without affecting any other reader.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::device::FrameSource;
use crate::stats::{ReaderStats, ReaderStatsSnapshot};
use crate::stream::{FrameRef, StreamKind};
use crate::subscriber::{FrameCallback, SubscriberId};

/// An open reader bound to exactly one subscriber
#[derive(Debug)]
pub(crate) struct StreamReader {
    subscriber: SubscriberId,
    kind: StreamKind,
    paused: Arc<AtomicBool>,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    stats: Arc<ReaderStats>,
}

impl StreamReader {
    /// Spawn the delivery task for one subscriber on the given source
    pub(crate) fn spawn(
        kind: StreamKind,
        subscriber: SubscriberId,
        source: &FrameSource,
        callback: FrameCallback,
        start_paused: bool,
    ) -> Self {
        let paused = Arc::new(AtomicBool::new(start_paused));
        let (stop, mut stop_rx) = watch::channel(false);
        let stats = Arc::new(ReaderStats::new());
        let mut rx = source.subscribe();

        let task_paused = Arc::clone(&paused);
        let task_stats = Arc::clone(&stats);
        let handle = tokio::spawn(async move {
            let slot = Arc::new(Mutex::new(None));

            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    received = rx.recv() => match received {
                        Ok(frame) => {
                            if task_paused.load(Ordering::Acquire) {
                                continue;
                            }

                            task_stats.record_delivered();
                            *slot.lock().unwrap() = Some(frame);
                            callback(FrameRef::from_slot(Arc::clone(&slot)));
                        }
                        Err(RecvError::Lagged(count)) => {
                            task_stats.record_skipped(count);
                            tracing::debug!(
                                subscriber = %subscriber,
                                kind = %kind,
                                skipped = count,
                                "reader lagged, frames skipped"
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }

            tracing::debug!(subscriber = %subscriber, kind = %kind, "reader task finished");
        });

        Self {
            subscriber,
            kind,
            paused,
            stop,
            handle,
            stats,
        }
    }

    /// Flip the paused flag
    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// Whether this reader is currently paused
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Delivery counters for this reader
    pub(crate) fn stats(&self) -> ReaderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Pause, signal stop, and wait for the delivery task to finish
    ///
    /// Waiting guarantees no callback is still mid-execution when the caller
    /// goes on to release the device handle.
    pub(crate) async fn close(self) {
        self.set_paused(true);
        let _ = self.stop.send(true);

        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!(
                    subscriber = %self.subscriber,
                    kind = %self.kind,
                    error = %e,
                    "reader task ended abnormally"
                );
            }
        }
    }
}
