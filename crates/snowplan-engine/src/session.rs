//! Project session
//!
//! The explicitly constructed context owning one project's live state:
//! the Project State Cache, the mutation coalescer, and the snapshot
//! pump. A session is one project's lifetime: switching projects means
//! tearing this session down and opening another, which is what keeps
//! "at most one live subscription" true by construction.
//!
//! All operations must run inside the tokio runtime that opened the
//! session; timers and writes are spawned onto it.

use crate::coalescer::Coalescer;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::{EventSink, FieldRef, SessionEvent};
use crate::order::{self, EdgeHint};
use crate::reconcile::reconcile;
use parking_lot::Mutex;
use snowplan_model::{NewProject, Project, ProjectId, StepKey};
use snowplan_store::{ProjectStore, SnapshotEvent, Subscription, UpdateMap};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live editing session for one project
pub struct ProjectSession {
    shared: Arc<Shared>,
}

struct Shared {
    project_id: ProjectId,
    store: Arc<dyn ProjectStore>,
    cache: Mutex<Project>,
    coalescer: Coalescer,
    events: EventSink,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ProjectSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectSession")
            .field("project_id", &self.shared.project_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ProjectSession {
    /// Open a session for an existing project
    ///
    /// Reads the project, seeds the cache, subscribes, and starts the
    /// snapshot pump. The returned receiver carries every
    /// [`SessionEvent`] for the session's lifetime; the subscription's
    /// initial snapshot arrives as the first `ProjectChanged`.
    ///
    /// # Errors
    /// [`SessionError::Store`] with `NotFound` is terminal for this
    /// project; callers should navigate away.
    pub async fn open(
        store: Arc<dyn ProjectStore>,
        project_id: ProjectId,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let project = store.get(&project_id).await?;
        let subscription = store.subscribe(&project_id).await?;

        let (events, rx) = EventSink::channel();
        let coalescer = Coalescer::new(
            Arc::clone(&store),
            project_id,
            events.clone(),
            config.debounce_window,
        );
        let shared = Arc::new(Shared {
            project_id,
            store,
            cache: Mutex::new(project),
            coalescer,
            events,
            pump: Mutex::new(None),
        });
        let pump = tokio::spawn(Self::pump(Arc::clone(&shared), subscription));
        *shared.pump.lock() = Some(pump);

        tracing::info!(project = %project_id, "session opened");
        Ok((Self { shared }, rx))
    }

    /// Create a project from a template and open a session for it
    pub async fn create(
        store: Arc<dyn ProjectStore>,
        spec: NewProject,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let project = store.create(spec).await?;
        Self::open(store, project.id, config).await
    }

    /// The project this session owns
    #[inline]
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.shared.project_id
    }

    /// Current cache state
    #[must_use]
    pub fn snapshot(&self) -> Project {
        self.shared.cache.lock().clone()
    }

    /// The selected step, defaulting to the lowest order when unset
    #[must_use]
    pub fn current_step(&self) -> Option<StepKey> {
        self.shared.cache.lock().current_or_default()
    }

    /// Fields with writes pending or in flight
    #[must_use]
    pub fn pending_fields(&self) -> HashSet<FieldRef> {
        self.shared.coalescer.dirty_fields()
    }

    /// Whether the session has been torn down
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.events.is_closed()
    }

    /// Apply a content edit optimistically and schedule its persistence
    ///
    /// The cache (including the derived completion flag and word count)
    /// updates before this returns; the write goes out after the
    /// debounce window, coalesced with any edits that follow.
    pub fn edit_content(&self, key: &StepKey, text: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let project = {
            let mut cache = self.shared.cache.lock();
            let step = cache
                .step_mut(key)
                .ok_or_else(|| SessionError::UnknownStep(key.clone()))?;
            step.set_content(text);
            cache.clone()
        };
        self.shared.events.send(SessionEvent::ProjectChanged(project));
        self.shared
            .coalescer
            .submit_debounced(FieldRef::Content(key.clone()), UpdateMap::content_edit(key, text));
        Ok(())
    }

    /// Select the current step; commits immediately
    pub fn select_step(&self, key: &StepKey) -> Result<(), SessionError> {
        self.ensure_open()?;
        let project = {
            let mut cache = self.shared.cache.lock();
            if !cache.contains_step(key) {
                return Err(SessionError::UnknownStep(key.clone()));
            }
            if cache.current_step.as_ref() == Some(key) {
                return Ok(());
            }
            cache.current_step = Some(key.clone());
            cache.clone()
        };
        self.shared.events.send(SessionEvent::ProjectChanged(project));
        self.shared
            .coalescer
            .submit_immediate(FieldRef::CurrentStep, UpdateMap::select(key));
        Ok(())
    }

    /// Rename the project; commits immediately
    pub fn rename(&self, title: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let project = {
            let mut cache = self.shared.cache.lock();
            cache.title = title.to_string();
            cache.clone()
        };
        self.shared.events.send(SessionEvent::ProjectChanged(project));
        self.shared
            .coalescer
            .submit_immediate(FieldRef::Title, UpdateMap::rename(title));
        Ok(())
    }

    /// Commit a new total order after a drag gesture
    ///
    /// `None` (no vertical displacement) is a no-op. Otherwise the new
    /// order applies to the cache immediately and the whole order batch
    /// is written in one call.
    pub fn reorder(&self, dragged: &StepKey, hint: Option<EdgeHint>) -> Result<(), SessionError> {
        self.ensure_open()?;
        let Some(hint) = hint else {
            return Ok(());
        };
        let (orders, project) = {
            let mut cache = self.shared.cache.lock();
            if !cache.contains_step(dragged) {
                return Err(SessionError::UnknownStep(dragged.clone()));
            }
            let orders = order::reorder(&cache.steps, dragged, Some(hint));
            for (key, order) in &orders {
                if let Some(step) = cache.step_mut(key) {
                    step.order = *order;
                }
            }
            (orders, cache.clone())
        };
        self.shared.events.send(SessionEvent::ProjectChanged(project));
        self.shared
            .coalescer
            .submit_immediate(FieldRef::Ordering, UpdateMap::reorder(&orders));
        Ok(())
    }

    /// Reorder from raw drag coordinates
    pub fn reorder_by_displacement(
        &self,
        dragged: &StepKey,
        start_y: f64,
        end_y: f64,
    ) -> Result<(), SessionError> {
        self.reorder(dragged, EdgeHint::from_displacement(start_y, end_y))
    }

    /// Re-attempt a failed write immediately
    pub fn retry(&self, field: &FieldRef) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.shared.coalescer.retry(field);
        Ok(())
    }

    /// Delete the project and end the session
    ///
    /// The delete is atomic at the store; the session is torn down
    /// whether or not it succeeds.
    pub async fn delete(self) -> Result<(), SessionError> {
        let result = self.shared.store.delete(&self.shared.project_id).await;
        self.shared.close();
        result.map_err(SessionError::from)
    }

    /// Tear the session down
    ///
    /// Synchronously halts the snapshot pump and every debounce timer.
    /// Writes already dispatched complete at the store but are no longer
    /// applied or reported here.
    pub fn teardown(self) {
        self.shared.close();
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    async fn pump(shared: Arc<Shared>, mut subscription: Subscription) {
        loop {
            match subscription.recv().await {
                Some(SnapshotEvent::Changed(remote)) => shared.apply_snapshot(remote),
                Some(SnapshotEvent::Gone) => {
                    tracing::info!(project = %shared.project_id, "project gone");
                    shared.events.send(SessionEvent::ProjectGone);
                    shared.close();
                    break;
                }
                None => {
                    if !shared.events.is_closed() {
                        tracing::warn!(project = %shared.project_id, "subscription lost");
                        shared.events.send(SessionEvent::SubscriptionLost(
                            "snapshot channel closed".to_string(),
                        ));
                    }
                    break;
                }
            }
        }
    }
}

impl Drop for ProjectSession {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl Shared {
    /// Merge an incoming snapshot into the cache
    fn apply_snapshot(&self, remote: Project) {
        if self.events.is_closed() {
            return;
        }
        let dirty = self.coalescer.dirty_fields();
        let merged = {
            let mut cache = self.cache.lock();
            let merged = reconcile(&cache, remote, &dirty);
            *cache = merged.clone();
            merged
        };
        // Indistinguishable from a local mutation for consumers.
        self.events.send(SessionEvent::ProjectChanged(merged));
    }

    /// Idempotent teardown: silence events, stop the pump, drop timers
    fn close(&self) {
        if !self.events.close() {
            return;
        }
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        self.coalescer.shutdown();
        tracing::debug!(project = %self.project_id, "session closed");
    }
}
