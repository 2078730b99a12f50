use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{ApplyError, PipelineError},
    transition::Transition,
    types::{Entry, Snapshot},
};

/// Snapshot stamped with its submission sequence number.
#[derive(Debug)]
pub(crate) struct QueuedSnapshot<I, K, C> {
    pub(crate) seq: u64,
    pub(crate) snapshot: Arc<Snapshot<I, K, C>>,
}

impl<I, K, C> Clone for QueuedSnapshot<I, K, C> {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

type SnapshotSlot<I, K, C> = Option<QueuedSnapshot<I, K, C>>;

struct SenderInner<I, K, C> {
    slot: watch::Sender<SnapshotSlot<I, K, C>>,
    next_seq: AtomicU64,
}

/// Producer handle feeding a single-slot, keep-latest snapshot buffer.
///
/// Submitting overwrites any snapshot the worker has not picked up yet.
pub struct SnapshotSender<I, K, C> {
    inner: Arc<SenderInner<I, K, C>>,
}

impl<I, K, C> Clone for SnapshotSender<I, K, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, K, C> SnapshotSender<I, K, C> {
    pub(crate) fn new() -> (Self, watch::Receiver<SnapshotSlot<I, K, C>>) {
        let (slot, slot_rx) = watch::channel(None);
        (
            Self {
                inner: Arc::new(SenderInner {
                    slot,
                    next_seq: AtomicU64::new(0),
                }),
            },
            slot_rx,
        )
    }

    /// Replace the pending snapshot. Returns the sequence number assigned to it.
    pub fn submit(&self, snapshot: impl Into<Snapshot<I, K, C>>) -> Result<u64, PipelineError> {
        if self.inner.slot.is_closed() {
            return Err(PipelineError::closed());
        }

        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let queued = QueuedSnapshot {
            seq,
            snapshot: Arc::new(snapshot.into()),
        };
        // Concurrent submitters may race; the slot only ever moves forward.
        self.inner.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|current| current.seq > seq) {
                return false;
            }
            *slot = Some(queued);
            true
        });
        Ok(seq)
    }

    /// `true` once the worker has stopped listening.
    pub fn is_closed(&self) -> bool {
        self.inner.slot.is_closed()
    }
}

/// A transition waiting to be applied on the view thread.
#[derive(Debug)]
pub struct PendingApply<I, K, C> {
    generation: u64,
    transition: Transition<C>,
    entries: Arc<Snapshot<I, K, C>>,
    ack: oneshot::Sender<()>,
    stop: CancellationToken,
}

impl<I, K, C> PendingApply<I, K, C> {
    pub(crate) fn new(
        generation: u64,
        transition: Transition<C>,
        entries: Arc<Snapshot<I, K, C>>,
        ack: oneshot::Sender<()>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            generation,
            transition,
            entries,
            ack,
            stop,
        }
    }

    /// Monotonic counter of transitions produced by this pipeline.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn transition(&self) -> &Transition<C> {
        &self.transition
    }

    /// Entries the view displays once this transition is applied.
    pub fn entries(&self) -> &[Entry<I, K, C>] {
        &self.entries.entries
    }

    /// `true` when the pipeline was torn down and this transition must be dropped.
    pub fn is_cancelled(&self) -> bool {
        self.stop.is_cancelled() || self.ack.is_closed()
    }

    /// Run `apply` on the view and acknowledge the transition on success.
    ///
    /// The closure is not called for a transition that is already cancelled,
    /// and `ApplyError::Cancelled` always means the view was left untouched.
    /// Teardown can still land while the closure runs; the view then holds the
    /// new rows, the result is `Ok` and the acknowledgement goes nowhere. When
    /// the closure fails, no acknowledgement is sent and the pipeline treats
    /// the view as detached.
    pub fn apply<R, E>(
        self,
        apply: impl FnOnce(Transition<C>) -> Result<R, E>,
    ) -> Result<R, ApplyError<E>> {
        if self.is_cancelled() {
            return Err(ApplyError::Cancelled);
        }
        let result = apply(self.transition).map_err(ApplyError::View)?;
        if self.ack.send(()).is_err() {
            debug!(
                generation = self.generation,
                "pipeline stopped while the view applied a transition"
            );
        }
        Ok(result)
    }
}

/// View-side receiver of transitions, drained on the UI thread.
#[derive(Debug)]
pub struct ApplyQueue<I, K, C> {
    rx: mpsc::Receiver<PendingApply<I, K, C>>,
}

impl<I, K, C> ApplyQueue<I, K, C> {
    pub(crate) fn new(capacity: usize) -> (mpsc::Sender<PendingApply<I, K, C>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    /// Wait for the next transition. `None` once the pipeline is gone.
    pub async fn recv(&mut self) -> Option<PendingApply<I, K, C>> {
        self.rx.recv().await
    }

    /// Poll from a UI event loop without blocking.
    pub fn try_recv(&mut self) -> Option<PendingApply<I, K, C>> {
        self.rx.try_recv().ok()
    }

    /// Block a non-async UI thread until the next transition arrives.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<PendingApply<I, K, C>> {
        self.rx.blocking_recv()
    }
}
