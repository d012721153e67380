//! Frame producer/consumer pipeline
//!
//! Frames arrive at whatever rate the source produces them. They wait in a
//! bounded queue; when the queue is full new frames are dropped rather than
//! back-pressuring the source. A single consumer task classifies frames in
//! order on the blocking pool and forwards the results to a
//! [`PredictionFeed`], which discards any result computed by a classifier that
//! has since been replaced.

use crate::active::{ActiveClassifier, ClassifiedFrame};
use frameclass_core::Frame;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Predictions for one submitted frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    /// Sequence number of the frame that was classified
    pub sequence: u64,
    pub classified: ClassifiedFrame,
}

/// Counters for a running pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames accepted into the queue
    pub accepted: u64,
    /// Frames dropped because the queue was full
    pub dropped: u64,
    /// Frames that produced predictions
    pub classified: u64,
}

#[derive(Default)]
struct Counters {
    accepted: AtomicU64,
    dropped: AtomicU64,
    classified: AtomicU64,
}

/// Handle to the frame queue and its consumer task
pub struct FramePipeline {
    frames: Option<mpsc::Sender<Frame>>,
    counters: Arc<Counters>,
    worker: Option<JoinHandle<()>>,
}

impl FramePipeline {
    /// Start the consumer task. Must be called from within a tokio runtime.
    pub fn spawn(active: Arc<ActiveClassifier>, capacity: usize) -> (Self, PredictionFeed) {
        let capacity = capacity.max(1);
        let (frame_tx, frame_rx) = mpsc::channel(capacity);
        let (outcome_tx, outcome_rx) = mpsc::channel(capacity);
        let counters = Arc::new(Counters::default());

        let worker = tokio::spawn(consume(
            Arc::clone(&active),
            frame_rx,
            outcome_tx,
            Arc::clone(&counters),
        ));

        let pipeline = Self {
            frames: Some(frame_tx),
            counters,
            worker: Some(worker),
        };
        let feed = PredictionFeed {
            outcomes: outcome_rx,
            active,
            stale: 0,
        };
        (pipeline, feed)
    }

    /// Offer a frame without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, frame: Frame) -> bool {
        let Some(frames) = &self.frames else {
            return false;
        };
        match frames.try_send(frame) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(frame)) => {
                debug!("Frame queue full, dropping frame {}", frame.sequence);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queue a frame, waiting for space instead of dropping it
    pub async fn submit_wait(&self, frame: Frame) -> bool {
        let Some(frames) = &self.frames else {
            return false;
        };
        if frames.send(frame).await.is_ok() {
            self.counters.accepted.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            classified: self.counters.classified.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait for queued frames to finish.
    ///
    /// The feed must be drained (or dropped) concurrently, otherwise the
    /// consumer can block on a full result channel.
    pub async fn shutdown(mut self) -> PipelineStats {
        self.frames.take();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("Frame consumer task failed: {}", e);
            }
        }
        self.stats()
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn consume(
    active: Arc<ActiveClassifier>,
    mut frames: mpsc::Receiver<Frame>,
    outcomes: mpsc::Sender<FrameOutcome>,
    counters: Arc<Counters>,
) {
    while let Some(frame) = frames.recv().await {
        let sequence = frame.sequence;
        let active = Arc::clone(&active);
        let result = tokio::task::spawn_blocking(move || active.classify(&frame.image)).await;

        match result {
            Ok(Some(classified)) => {
                counters.classified.fetch_add(1, Ordering::Relaxed);
                let outcome = FrameOutcome {
                    sequence,
                    classified,
                };
                if outcomes.send(outcome).await.is_err() {
                    debug!("Prediction feed closed, stopping frame consumer");
                    break;
                }
            }
            Ok(None) => debug!("No predictions for frame {}", sequence),
            Err(e) => warn!("Classification task for frame {} failed: {}", sequence, e),
        }
    }
}

/// Receiving end of the pipeline, as seen by the presentation layer
pub struct PredictionFeed {
    outcomes: mpsc::Receiver<FrameOutcome>,
    active: Arc<ActiveClassifier>,
    stale: u64,
}

impl PredictionFeed {
    /// Next result from the classifier that is active right now.
    ///
    /// Results from replaced classifiers are skipped. Returns `None` once the
    /// pipeline has shut down and every result has been delivered.
    pub async fn next(&mut self) -> Option<FrameOutcome> {
        while let Some(outcome) = self.outcomes.recv().await {
            let current = self.active.generation();
            if outcome.classified.generation == current {
                return Some(outcome);
            }
            debug!(
                "Dropping stale predictions for frame {} (generation {}, active {})",
                outcome.sequence, outcome.classified.generation, current
            );
            self.stale += 1;
        }
        None
    }

    /// Results discarded because their classifier was replaced
    pub fn stale_count(&self) -> u64 {
        self.stale
    }
}
