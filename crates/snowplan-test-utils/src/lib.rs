//! Testing utilities for the snowplan workspace
//!
//! Shared fixtures, a write-recording store wrapper, and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use snowplan_model::{NewProject, Project, ProjectId, StepKey, Template, TemplateStep};
use snowplan_store::{
    ProjectStore, RemoteStore, StoreError, Subscription, UpdateMap,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Install a tracing subscriber honoring `RUST_LOG`; safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creation spec on the basic template
pub fn sample_spec(title: &str) -> NewProject {
    NewProject::new(title, Template::basic().clone())
}

/// Minimal two-step template (`summary`, `characters`)
pub fn two_step_template() -> Template {
    Template {
        id: "two-step".to_string(),
        name: "Two Step".to_string(),
        description: "Minimal fixture template".to_string(),
        icon: "📝".to_string(),
        steps: vec![
            TemplateStep {
                key: StepKey::from("summary"),
                title: "Summary".to_string(),
                icon: "💡".to_string(),
                prompt: "Summarize.".to_string(),
            },
            TemplateStep {
                key: StepKey::from("characters"),
                title: "Characters".to_string(),
                icon: "👤".to_string(),
                prompt: "Who appears?".to_string(),
            },
        ],
    }
}

/// Store wrapper that records committed writes and can inject failures
///
/// Delegates everything to an in-process [`RemoteStore`]; `updates()`
/// returns each successful update with the instant it was committed
/// (pairs well with `tokio::time::pause`). While `set_fail_writes(true)`
/// is in effect, updates are rejected before reaching the inner store
/// and only counted as attempts.
#[derive(Clone)]
pub struct RecordingStore {
    inner: RemoteStore,
    updates: Arc<Mutex<Vec<(Instant, UpdateMap)>>>,
    attempts: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
    write_delay: Arc<Mutex<Duration>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: RemoteStore::connect(),
            updates: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            write_delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Make every update take this long before committing; pairs with
    /// `tokio::time::pause` to hold a write in flight deterministically.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock() = delay;
    }

    /// The shared inner store, e.g. to act as a second device
    pub fn remote(&self) -> RemoteStore {
        self.inner.clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful updates in commit order
    pub fn updates(&self) -> Vec<(Instant, UpdateMap)> {
        self.updates.lock().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    /// All update attempts, including rejected ones
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for RecordingStore {
    async fn create(&self, spec: NewProject) -> Result<Project, StoreError> {
        self.inner.create(spec).await
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        self.inner.list().await
    }

    async fn update(&self, id: &ProjectId, updates: UpdateMap) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.write_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("injected failure".to_string()));
        }
        self.inner.update(id, updates.clone()).await?;
        self.updates.lock().push((Instant::now(), updates));
        Ok(())
    }

    async fn subscribe(&self, id: &ProjectId) -> Result<Subscription, StoreError> {
        self.inner.subscribe(id).await
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}
