//! Per-screen reconciliation pipeline.
//!
//! One worker task per screen owns the last applied snapshot. Producers submit
//! snapshots into a keep-latest slot; the worker diffs the newest one against
//! the last applied snapshot on the blocking pool, hands the transition to the
//! view through an [`ApplyQueue`] and waits for the view's acknowledgement
//! before it looks at the slot again. Only an acknowledged transition replaces
//! the last applied snapshot.

use std::{fmt, hash::Hash, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::{
    channel::{ApplyQueue, PendingApply, QueuedSnapshot, SnapshotSender},
    config::PipelineConfig,
    error::{PipelineError, PipelineErrorCategory},
    reconcile::reconcile,
    state_machine::{PipelineState, PipelineStateMachine},
    transition::ScrollIntent,
    types::{ScrollRequest, Snapshot},
    validation::validate_snapshot,
};

/// Observable progress of a screen pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStatus {
    pub state: PipelineState,
    /// Generation of the last transition the view acknowledged (0 before any).
    pub applied_generation: u64,
    /// Number of rows in the last applied snapshot.
    pub applied_len: usize,
    /// Sequence number of the last snapshot the worker picked up.
    pub last_seq: u64,
    /// Snapshots overwritten in the slot before the worker could pick them up.
    pub collapsed_snapshots: u64,
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
            applied_generation: 0,
            applied_len: 0,
            last_seq: 0,
            collapsed_snapshots: 0,
        }
    }
}

/// Handle to the reconciliation worker of one screen.
///
/// Dropping the handle tears the worker down; the last applied snapshot is
/// discarded with it.
pub struct ScreenPipeline<I, K, C> {
    snapshots: SnapshotSender<I, K, C>,
    status: watch::Receiver<PipelineStatus>,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<I, K, C> ScreenPipeline<I, K, C>
where
    I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    K: Ord + Send + Sync + 'static,
    C: PartialEq + Clone + Send + Sync + 'static,
{
    /// Start the worker on `runtime` and return the view-side apply queue.
    pub fn spawn(config: PipelineConfig, runtime: &Handle) -> (Self, ApplyQueue<I, K, C>) {
        debug!(
            reverse = config.reverse,
            animate_initial = config.animate_initial,
            apply_queue_capacity = config.apply_queue_capacity,
            "spawning screen pipeline"
        );

        let (snapshots, slot_rx) = SnapshotSender::new();
        let (apply_tx, apply_queue) = ApplyQueue::new(config.apply_queue_capacity);
        let (status_tx, status) = watch::channel(PipelineStatus::default());
        let stop = CancellationToken::new();

        let worker = Worker {
            config,
            slot_rx,
            apply_tx,
            status_tx,
            stop: stop.clone(),
            state: PipelineStateMachine::default(),
            last_applied: Arc::new(Snapshot::new(Vec::new())),
            applied_generation: 0,
            last_seq: 0,
            collapsed_snapshots: 0,
        };
        let task = runtime.spawn(worker.run());

        (
            Self {
                snapshots,
                status,
                stop,
                task: Some(task),
            },
            apply_queue,
        )
    }
}

impl<I, K, C> ScreenPipeline<I, K, C> {
    /// Producer handle that can be moved into state-observing tasks.
    pub fn sender(&self) -> SnapshotSender<I, K, C> {
        self.snapshots.clone()
    }

    /// Replace the pending snapshot with `snapshot`.
    pub fn submit(&self, snapshot: impl Into<Snapshot<I, K, C>>) -> Result<u64, PipelineError> {
        self.snapshots.submit(snapshot)
    }

    pub fn status(&self) -> PipelineStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.clone()
    }

    /// Cancel in-flight work and wait for the worker to exit.
    pub async fn shutdown(mut self) {
        debug!("shutting down screen pipeline");
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<I, K, C> Drop for ScreenPipeline<I, K, C> {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum Cycle {
    Applied,
    Skipped,
    Stopped,
}

struct Worker<I, K, C> {
    config: PipelineConfig,
    slot_rx: watch::Receiver<Option<QueuedSnapshot<I, K, C>>>,
    apply_tx: mpsc::Sender<PendingApply<I, K, C>>,
    status_tx: watch::Sender<PipelineStatus>,
    stop: CancellationToken,
    state: PipelineStateMachine,
    last_applied: Arc<Snapshot<I, K, C>>,
    applied_generation: u64,
    last_seq: u64,
    collapsed_snapshots: u64,
}

impl<I, K, C> Worker<I, K, C>
where
    I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    K: Ord + Send + Sync + 'static,
    C: PartialEq + Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        debug!("screen pipeline worker started");
        loop {
            let queued = tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                changed = self.slot_rx.changed() => {
                    if changed.is_err() {
                        debug!("all snapshot senders dropped");
                        break;
                    }
                    let Some(queued) = self.slot_rx.borrow_and_update().clone() else {
                        continue;
                    };
                    queued
                }
            };

            match self.run_cycle(queued).await {
                Ok(Cycle::Applied) | Ok(Cycle::Skipped) => {}
                Ok(Cycle::Stopped) => break,
                Err(err) => {
                    match err.category {
                        PipelineErrorCategory::Internal => {
                            error!(error = %err, "screen pipeline cycle failed")
                        }
                        _ => warn!(error = %err, "screen pipeline stopping"),
                    }
                    break;
                }
            }
        }

        self.state.tear_down();
        self.publish();
        debug!(
            applied_generation = self.applied_generation,
            "screen pipeline worker exiting"
        );
    }

    async fn run_cycle(&mut self, queued: QueuedSnapshot<I, K, C>) -> Result<Cycle, PipelineError> {
        let QueuedSnapshot { seq, snapshot } = queued;
        self.note_pickup(seq);
        self.state.begin_cycle()?;
        self.publish();

        if let Err(err) = validate_snapshot(&snapshot.entries) {
            warn!(seq, error = %err, "snapshot violates producer contract");
        }

        let old = Arc::clone(&self.last_applied);
        let new = Arc::clone(&snapshot);
        let diff = tokio::task::spawn_blocking(move || reconcile(&old.entries, &new.entries));
        let transition = tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Ok(Cycle::Stopped),
            joined = diff => joined.map_err(|err| {
                PipelineError::new(
                    PipelineErrorCategory::Internal,
                    "reconcile_failed",
                    err.to_string(),
                )
            })?,
        };

        let animated = self.applied_generation > 0 || self.config.animate_initial;
        let transition = transition
            .with_animation(animated)
            .with_scroll(resolve_scroll(&snapshot))
            .oriented(self.config.reverse);

        if transition.is_empty() && transition.scroll == ScrollIntent::None {
            trace!(seq, "snapshot renders identically; nothing to apply");
            self.last_applied = snapshot;
            self.state.skip_apply()?;
            self.publish();
            return Ok(Cycle::Skipped);
        }

        let generation = self.applied_generation + 1;
        debug!(seq, generation, summary = %transition, "handing transition to view");
        self.state.hand_off()?;
        self.publish();

        let (ack_tx, ack_rx) = oneshot::channel();
        let pending = PendingApply::new(
            generation,
            transition,
            Arc::clone(&snapshot),
            ack_tx,
            self.stop.clone(),
        );
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Ok(Cycle::Stopped),
            sent = self.apply_tx.send(pending) => sent
                .map_err(|_| PipelineError::view_detached("apply queue was dropped"))?,
        }
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Ok(Cycle::Stopped),
            acked = ack_rx => acked.map_err(|_| {
                PipelineError::view_detached("transition was dropped without acknowledgement")
            })?,
        }

        self.state.complete_apply()?;
        self.last_applied = snapshot;
        self.applied_generation = generation;
        self.publish();
        trace!(generation, "view acknowledged transition");
        Ok(Cycle::Applied)
    }

    fn note_pickup(&mut self, seq: u64) {
        let skipped = seq.saturating_sub(self.last_seq).saturating_sub(1);
        if skipped > 0 {
            trace!(seq, skipped, "collapsed intermediate snapshots");
        }
        self.collapsed_snapshots += skipped;
        self.last_seq = seq;
    }

    fn publish(&self) {
        self.status_tx.send_replace(PipelineStatus {
            state: self.state.state(),
            applied_generation: self.applied_generation,
            applied_len: self.last_applied.entries.len(),
            last_seq: self.last_seq,
            collapsed_snapshots: self.collapsed_snapshots,
        });
    }
}

fn resolve_scroll<I: PartialEq, K, C>(snapshot: &Snapshot<I, K, C>) -> ScrollIntent {
    match &snapshot.scroll {
        ScrollRequest::None => ScrollIntent::None,
        ScrollRequest::PreserveVisible(edge) => ScrollIntent::PreserveVisible(*edge),
        ScrollRequest::Reveal { stable_id, anchor } => {
            match snapshot
                .entries
                .iter()
                .position(|entry| entry.stable_id == *stable_id)
            {
                Some(position) => ScrollIntent::Reveal {
                    position,
                    anchor: *anchor,
                },
                None => {
                    debug!("scroll target is not part of the snapshot; ignoring");
                    ScrollIntent::None
                }
            }
        }
    }
}
