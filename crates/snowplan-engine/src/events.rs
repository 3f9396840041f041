//! Typed session notifications
//!
//! The session pushes every observable change through one typed channel;
//! consumers (sidebar, editor, save indicator) subscribe to the receiver
//! returned by [`crate::session::ProjectSession::open`] and cannot tell a
//! local optimistic mutation apart from a merged remote snapshot.

use snowplan_model::{Project, StepKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One coalescing unit: a field whose writes are sequenced together
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldRef {
    /// One step's text (debounced; persists the content/completed/word
    /// count triple)
    Content(StepKey),
    /// The current-step selection pointer (immediate)
    CurrentStep,
    /// The project title (immediate)
    Title,
    /// The whole order layout written by a reorder (immediate, batched)
    Ordering,
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRef::Content(key) => write!(f, "content:{key}"),
            FieldRef::CurrentStep => f.write_str("currentStep"),
            FieldRef::Title => f.write_str("title"),
            FieldRef::Ordering => f.write_str("ordering"),
        }
    }
}

/// Persistence state of one field, as shown by the save indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// An edit is waiting out its debounce window or a write is in flight
    Pending,
    /// The latest submitted value reached the store
    Committed,
    /// The write failed; the optimistic value is retained and a resubmit
    /// or explicit retry is required
    Failed(String),
}

/// Notification pushed to the session's consumer
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The cache changed (optimistic mutation or merged snapshot)
    ProjectChanged(Project),
    /// A field's save state transitioned
    SaveState {
        /// The field whose state changed
        field: FieldRef,
        /// The new state
        state: SaveState,
    },
    /// The project was deleted; terminal for this session
    ProjectGone,
    /// The snapshot channel died; the caller must re-open to resume
    SubscriptionLost(String),
}

/// Sender half shared by the session internals
///
/// Once closed, sends become no-ops: a torn-down session must not emit.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    pub(crate) fn send(&self, event: SessionEvent) {
        if self.is_closed() {
            return;
        }
        // A dropped receiver is not an error; the session may outlive a
        // consumer that stopped listening.
        let _ = self.tx.send(event);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark closed; returns whether this call did the closing
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }
}
