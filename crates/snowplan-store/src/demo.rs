//! Local demo backend
//!
//! Demo-mode persistence for sessions without an account: projects live
//! in a JSON file on disk (the local key-value layer), timestamps are
//! assigned by the client clock, writes complete after a simulated
//! network delay, and subscriptions poll on an interval instead of
//! receiving pushes.

use crate::adapter::ProjectStore;
use crate::error::StoreError;
use crate::fields::UpdateMap;
use crate::snapshot::{SnapshotEvent, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use snowplan_model::{NewProject, Project, ProjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Tuning for the demo backend's simulated asynchrony
#[derive(Debug, Clone, Copy)]
pub struct DemoStoreConfig {
    /// Simulated write latency
    pub latency: Duration,
    /// Subscription polling interval
    pub poll_interval: Duration,
}

impl DemoStoreConfig {
    /// Defaults matching the production demo mode
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With simulated write latency
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// With polling interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for DemoStoreConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(300),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// Poll-based store persisting to a local JSON file
#[derive(Debug, Clone)]
pub struct DemoStore {
    path: PathBuf,
    config: DemoStoreConfig,
    documents: Arc<Mutex<BTreeMap<ProjectId, Project>>>,
}

impl DemoStore {
    /// Open (or create) the persistence file at `path`
    ///
    /// # Errors
    /// [`StoreError::Persistence`] if the file exists but cannot be read
    /// or parsed.
    pub fn open(path: impl AsRef<Path>, config: DemoStoreConfig) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let documents = if path.exists() {
            let bytes = std::fs::read(&path).map_err(persistence)?;
            serde_json::from_slice(&bytes).map_err(persistence)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), "opened demo store");
        Ok(Self {
            path,
            config,
            documents: Arc::new(Mutex::new(documents)),
        })
    }

    /// Flush the document table to disk
    fn persist(&self) -> Result<(), StoreError> {
        let bytes = {
            let documents = self.documents.lock();
            serde_json::to_vec_pretty(&*documents).map_err(persistence)?
        };
        std::fs::write(&self.path, bytes).map_err(persistence)
    }
}

fn persistence(err: impl std::fmt::Display) -> StoreError {
    StoreError::Persistence(err.to_string())
}

#[async_trait]
impl ProjectStore for DemoStore {
    async fn create(&self, spec: NewProject) -> Result<Project, StoreError> {
        sleep(self.config.latency).await;
        let id = ProjectId::new();
        let project = Project::from_template(id, spec.title, &spec.template, Utc::now())?;
        self.documents.lock().insert(id, project.clone());
        self.persist()?;
        tracing::info!(project = %id, "created demo project");
        Ok(project)
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.documents
            .lock()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self.documents.lock().values().cloned().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn update(&self, id: &ProjectId, updates: UpdateMap) -> Result<(), StoreError> {
        sleep(self.config.latency).await;
        {
            let mut documents = self.documents.lock();
            let project = documents.get_mut(id).ok_or(StoreError::NotFound)?;
            updates.apply(project)?;
            // Client-assigned: the demo backend has no server clock.
            project.updated_at = Utc::now();
        }
        self.persist()?;
        tracing::debug!(project = %id, fields = updates.len(), "committed demo update");
        Ok(())
    }

    async fn subscribe(&self, id: &ProjectId) -> Result<Subscription, StoreError> {
        if !self.documents.lock().contains_key(id) {
            return Err(StoreError::NotFound);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let documents = Arc::clone(&self.documents);
        let id = *id;
        let poll_interval = self.config.poll_interval;
        let feeder = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let event = match documents.lock().get(&id) {
                    Some(project) => SnapshotEvent::Changed(project.clone()),
                    None => SnapshotEvent::Gone,
                };
                let terminal = matches!(event, SnapshotEvent::Gone);
                if tx.send(event).is_err() || terminal {
                    break;
                }
            }
        });
        tracing::debug!(project = %id, "subscribed (polling)");
        Ok(Subscription::with_feeder(rx, feeder))
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        sleep(self.config.latency).await;
        if self.documents.lock().remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        self.persist()?;
        tracing::info!(project = %id, "deleted demo project");
        Ok(())
    }
}
