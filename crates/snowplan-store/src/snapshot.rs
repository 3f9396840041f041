//! Subscription channel types

use snowplan_model::Project;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One delivery on a project subscription
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// Full current project state
    Changed(Project),
    /// Project was deleted or no longer exists; terminal for the channel
    Gone,
}

/// Live subscription to one project's snapshots
///
/// The backend delivers the full current state immediately after
/// subscribing and again after every subsequent change, in its natural
/// order. Dropping the subscription (or calling
/// [`Subscription::unsubscribe`]) halts delivery; any backend task
/// feeding the channel is aborted.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotEvent>,
    feeder: Option<AbortOnDrop>,
}

impl Subscription {
    pub(crate) fn from_channel(rx: mpsc::UnboundedReceiver<SnapshotEvent>) -> Self {
        Self { rx, feeder: None }
    }

    pub(crate) fn with_feeder(
        rx: mpsc::UnboundedReceiver<SnapshotEvent>,
        feeder: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            feeder: Some(AbortOnDrop(feeder)),
        }
    }

    /// Receive the next snapshot
    ///
    /// `None` means the channel is dead: the backend dropped it or the
    /// subscription failed. Callers must re-subscribe explicitly.
    pub async fn recv(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }

    /// Halt the subscription
    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[derive(Debug)]
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
