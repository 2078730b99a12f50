//! Stable-identity list reconciliation for screen views.
//!
//! This crate diffs ordered snapshots into row-level transitions, mirrors them
//! for bottom-up lists, and runs a per-screen worker that serializes
//! reconciliation with the view's acknowledgement of each applied transition.

/// Keep-latest snapshot slot and view-side apply queue.
pub mod channel;
/// Pipeline configuration and env parsing helpers.
pub mod config;
/// Stable pipeline error types.
pub mod error;
/// Per-screen reconciliation worker.
pub mod pipeline;
/// Snapshot diffing.
pub mod reconcile;
/// Reference row store that applies transitions.
pub mod rows;
/// Pipeline lifecycle state machine.
pub mod state_machine;
/// Row-level transitions and coordinate inversion.
pub mod transition;
/// Snapshot entry types and scroll requests.
pub mod types;
/// Producer contract checks for snapshots.
pub mod validation;

pub use channel::{ApplyQueue, PendingApply, SnapshotSender};
pub use config::{ConfigError, PipelineConfig};
pub use error::{ApplyError, PipelineError, PipelineErrorCategory};
pub use pipeline::{PipelineStatus, ScreenPipeline};
pub use reconcile::reconcile;
pub use rows::{RowApplyError, RowList, RowOp};
pub use state_machine::{PipelineState, PipelineStateMachine};
pub use transition::{ScrollIntent, Transition};
pub use types::{
    Anchor, Appearance, Entry, OrderKey, ScrollRequest, Snapshot, Themed, VisibleEdge,
};
pub use validation::{SnapshotError, validate_snapshot};
