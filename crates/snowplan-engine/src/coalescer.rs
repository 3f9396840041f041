//! Mutation coalescer
//!
//! Collapses rapid edits into a minimal stream of persisted writes.
//! Per field: the latest un-persisted value sits in a dirty slot, a
//! debounce timer decides when it becomes eligible, and at most one
//! write is ever in flight. A value that becomes eligible while a write
//! is outstanding waits in the dirty slot and is dispatched by that
//! write's completion, so writes for one field can never reorder
//! against each other at the store.

use crate::events::{EventSink, FieldRef, SaveState, SessionEvent};
use indexmap::IndexMap;
use parking_lot::Mutex;
use snowplan_model::ProjectId;
use snowplan_store::{ProjectStore, StoreError, UpdateMap};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct FieldState {
    /// Latest value not yet handed to the store
    dirty: Option<UpdateMap>,
    /// Pending debounce timer; absent once fired or for immediate fields
    timer: Option<JoinHandle<()>>,
    /// A write for this field is outstanding
    in_flight: bool,
}

/// What a write completion decided to do next, computed under the lock
enum AfterWrite {
    Commit,
    DispatchNext(UpdateMap),
    Fail(String),
    StillPending,
}

#[derive(Clone)]
pub(crate) struct Coalescer {
    store: Arc<dyn ProjectStore>,
    project_id: ProjectId,
    events: EventSink,
    window: Duration,
    fields: Arc<Mutex<IndexMap<FieldRef, FieldState>>>,
}

impl Coalescer {
    pub(crate) fn new(
        store: Arc<dyn ProjectStore>,
        project_id: ProjectId,
        events: EventSink,
        window: Duration,
    ) -> Self {
        Self {
            store,
            project_id,
            events,
            window,
            fields: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Record the latest value for a field and restart its debounce timer
    ///
    /// A timer already running for this field is superseded, not
    /// accumulated: only the most recent value within a quiescent window
    /// is ever persisted.
    pub(crate) fn submit_debounced(&self, field: FieldRef, update: UpdateMap) {
        if self.events.is_closed() {
            return;
        }
        {
            let mut fields = self.fields.lock();
            let state = fields.entry(field.clone()).or_default();
            state.dirty = Some(update);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            let this = self.clone();
            let timer_field = field.clone();
            let window = self.window;
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(window).await;
                this.flush(&timer_field);
            }));
        }
        self.events.send(SessionEvent::SaveState {
            field,
            state: SaveState::Pending,
        });
    }

    /// Record a value and flush it without a debounce window
    ///
    /// Used for fields with no intermediate states worth coalescing
    /// (selection, rename, reorder batches); still subject to the
    /// one-write-in-flight rule.
    pub(crate) fn submit_immediate(&self, field: FieldRef, update: UpdateMap) {
        if self.events.is_closed() {
            return;
        }
        {
            let mut fields = self.fields.lock();
            let state = fields.entry(field.clone()).or_default();
            state.dirty = Some(update);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
        self.events.send(SessionEvent::SaveState {
            field: field.clone(),
            state: SaveState::Pending,
        });
        self.flush(&field);
    }

    /// Re-attempt a field whose last write failed, skipping the window
    pub(crate) fn retry(&self, field: &FieldRef) {
        if self.events.is_closed() {
            return;
        }
        {
            let mut fields = self.fields.lock();
            if let Some(state) = fields.get_mut(field) {
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
            }
        }
        if self.flush(field) {
            self.events.send(SessionEvent::SaveState {
                field: field.clone(),
                state: SaveState::Pending,
            });
        }
    }

    /// Fields with a pending or in-flight write
    ///
    /// This set is the reconciler's exclusion list: snapshot values for
    /// these fields are discarded until the local write settles.
    pub(crate) fn dirty_fields(&self) -> HashSet<FieldRef> {
        self.fields
            .lock()
            .iter()
            .filter(|(_, state)| state.dirty.is_some() || state.in_flight)
            .map(|(field, _)| field.clone())
            .collect()
    }

    /// Abort every timer and forget all field state
    ///
    /// Writes already dispatched run to completion at the store, but
    /// their results are no longer applied or reported here.
    pub(crate) fn shutdown(&self) {
        let mut fields = self.fields.lock();
        for (_, state) in fields.iter_mut() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
        fields.clear();
    }

    /// Move an eligible dirty value into flight; true if a write was
    /// dispatched
    fn flush(&self, field: &FieldRef) -> bool {
        if self.events.is_closed() {
            return false;
        }
        let dispatch = {
            let mut fields = self.fields.lock();
            let Some(state) = fields.get_mut(field) else {
                return false;
            };
            state.timer = None;
            if state.in_flight {
                // Queued: this write's completion dispatches the value.
                None
            } else {
                state.dirty.take().map(|update| {
                    state.in_flight = true;
                    update
                })
            }
        };
        match dispatch {
            Some(update) => {
                self.dispatch(field.clone(), update);
                true
            }
            None => false,
        }
    }

    fn dispatch(&self, field: FieldRef, update: UpdateMap) {
        tracing::debug!(project = %self.project_id, field = %field, "dispatching write");
        let this = self.clone();
        tokio::spawn(async move {
            let result = this.store.update(&this.project_id, update.clone()).await;
            this.complete(field, update, result);
        });
    }

    fn complete(&self, field: FieldRef, attempted: UpdateMap, result: Result<(), StoreError>) {
        if self.events.is_closed() {
            return;
        }
        let after = {
            let mut fields = self.fields.lock();
            let Some(state) = fields.get_mut(&field) else {
                return;
            };
            state.in_flight = false;
            let queued = state.dirty.is_some() && state.timer.is_none();
            match result {
                Ok(()) if queued => {
                    state.in_flight = true;
                    AfterWrite::DispatchNext(state.dirty.take().unwrap_or_default())
                }
                Ok(()) if state.dirty.is_some() => {
                    // Newer edit still inside its debounce window; its own
                    // timer flushes it.
                    AfterWrite::StillPending
                }
                Ok(()) => AfterWrite::Commit,
                Err(err) if queued => {
                    // Superseded by a newer value; attempt that instead of
                    // reporting a stale failure.
                    tracing::warn!(project = %self.project_id, field = %field, error = %err,
                        "write failed, superseded value queued");
                    state.in_flight = true;
                    AfterWrite::DispatchNext(state.dirty.take().unwrap_or_default())
                }
                Err(err) => {
                    if state.dirty.is_none() {
                        // Keep the failed value dirty so a retry can
                        // re-attempt it and snapshots cannot revert it.
                        state.dirty = Some(attempted);
                    }
                    AfterWrite::Fail(err.to_string())
                }
            }
        };
        match after {
            AfterWrite::Commit => {
                self.events.send(SessionEvent::SaveState {
                    field,
                    state: SaveState::Committed,
                });
            }
            AfterWrite::DispatchNext(update) => self.dispatch(field, update),
            AfterWrite::Fail(reason) => {
                tracing::warn!(project = %self.project_id, field = %field, error = %reason,
                    "write failed");
                self.events.send(SessionEvent::SaveState {
                    field,
                    state: SaveState::Failed(reason),
                });
            }
            AfterWrite::StillPending => {}
        }
    }
}

impl std::fmt::Debug for Coalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coalescer")
            .field("project_id", &self.project_id)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
