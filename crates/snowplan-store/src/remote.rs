//! Hosted document service backend
//!
//! Client binding to the synced document service used by authenticated
//! sessions. Timestamps are assigned by the service at write time, and
//! snapshot delivery is push-based: every committed write fans out to
//! all live subscriptions immediately. Handles are cheap clones of one
//! connection; two handles onto the same service observe each other's
//! writes, which is also how tests stand in a second device.

use crate::adapter::ProjectStore;
use crate::error::StoreError;
use crate::fields::UpdateMap;
use crate::snapshot::{SnapshotEvent, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use snowplan_model::{NewProject, Project, ProjectId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Push-based store backed by the hosted document service
#[derive(Debug, Clone)]
pub struct RemoteStore {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    documents: Mutex<HashMap<ProjectId, Project>>,
    watchers: Mutex<HashMap<ProjectId, Vec<mpsc::UnboundedSender<SnapshotEvent>>>>,
}

impl RemoteStore {
    /// Connect a session-wide handle
    #[inline]
    #[must_use]
    pub fn connect() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// Push an event to every live watcher of a project, pruning dead ones
    fn notify(&self, id: &ProjectId, event: SnapshotEvent) {
        let mut watchers = self.shared.watchers.lock();
        if let Some(senders) = watchers.get_mut(id) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                watchers.remove(id);
            }
        }
    }
}

impl Default for RemoteStore {
    fn default() -> Self {
        Self::connect()
    }
}

#[async_trait]
impl ProjectStore for RemoteStore {
    async fn create(&self, spec: NewProject) -> Result<Project, StoreError> {
        let id = ProjectId::new();
        let project = Project::from_template(id, spec.title, &spec.template, Utc::now())?;
        self.shared.documents.lock().insert(id, project.clone());
        tracing::info!(project = %id, template = ?project.template_id, "created project");
        Ok(project)
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.shared
            .documents
            .lock()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self.shared.documents.lock().values().cloned().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn update(&self, id: &ProjectId, updates: UpdateMap) -> Result<(), StoreError> {
        let changed = {
            let mut documents = self.shared.documents.lock();
            let project = documents.get_mut(id).ok_or(StoreError::NotFound)?;
            updates.apply(project)?;
            project.updated_at = Utc::now();
            project.clone()
        };
        tracing::debug!(project = %id, fields = updates.len(), "committed update");
        self.notify(id, SnapshotEvent::Changed(changed));
        Ok(())
    }

    async fn subscribe(&self, id: &ProjectId) -> Result<Subscription, StoreError> {
        let current = self.get(id).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot before registering: the subscriber always sees
        // the state it subscribed against first.
        let _ = tx.send(SnapshotEvent::Changed(current));
        self.shared
            .watchers
            .lock()
            .entry(*id)
            .or_default()
            .push(tx);
        tracing::debug!(project = %id, "subscribed");
        Ok(Subscription::from_channel(rx))
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        let removed = self.shared.documents.lock().remove(id);
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        tracing::info!(project = %id, "deleted project");
        self.notify(id, SnapshotEvent::Gone);
        self.shared.watchers.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snowplan_model::{StepKey, Template};

    fn spec(title: &str) -> NewProject {
        NewProject::new(title, Template::basic().clone())
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = RemoteStore::connect();
        let created = store.create(spec("Novel")).await.unwrap();
        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = RemoteStore::connect();
        assert!(matches!(
            store.get(&ProjectId::new()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_assigns_server_timestamp() {
        let store = RemoteStore::connect();
        let created = store.create(spec("Novel")).await.unwrap();

        let key = StepKey::from("summary");
        store
            .update(&created.id, UpdateMap::content_edit(&key, "a hero rises"))
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert!(fetched.updated_at >= created.updated_at);
        assert_eq!(fetched.step(&key).unwrap().word_count, 3);
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_then_changes() {
        let store = RemoteStore::connect();
        let created = store.create(spec("Novel")).await.unwrap();

        let mut sub = store.subscribe(&created.id).await.unwrap();
        match sub.recv().await {
            Some(SnapshotEvent::Changed(p)) => assert_eq!(p.id, created.id),
            other => panic!("expected initial snapshot, got {other:?}"),
        }

        let key = StepKey::from("notes");
        store
            .update(&created.id, UpdateMap::content_edit(&key, "remember this"))
            .await
            .unwrap();
        match sub.recv().await {
            Some(SnapshotEvent::Changed(p)) => {
                assert_eq!(p.step(&key).unwrap().content, "remember this");
            }
            other => panic!("expected change snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_handle_observes_first_handles_writes() {
        let store = RemoteStore::connect();
        let other_device = store.clone();
        let created = store.create(spec("Shared")).await.unwrap();

        let mut sub = store.subscribe(&created.id).await.unwrap();
        let _ = sub.recv().await; // initial

        other_device
            .update(&created.id, UpdateMap::rename("Shared (edited)"))
            .await
            .unwrap();
        match sub.recv().await {
            Some(SnapshotEvent::Changed(p)) => assert_eq!(p.title, "Shared (edited)"),
            other => panic!("expected pushed snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_notifies_gone() {
        let store = RemoteStore::connect();
        let created = store.create(spec("Doomed")).await.unwrap();
        let mut sub = store.subscribe(&created.id).await.unwrap();
        let _ = sub.recv().await; // initial

        store.delete(&created.id).await.unwrap();
        assert!(matches!(sub.recv().await, Some(SnapshotEvent::Gone)));
        assert!(matches!(
            store.get(&created.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_orders_by_recency() {
        let store = RemoteStore::connect();
        let first = store.create(spec("First")).await.unwrap();
        let second = store.create(spec("Second")).await.unwrap();

        store
            .update(&first.id, UpdateMap::rename("First (touched)"))
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }
}
