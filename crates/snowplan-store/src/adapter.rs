//! The uniform store interface
//!
//! Callers are backend-agnostic: the engine holds an
//! `Arc<dyn ProjectStore>` chosen once per session at sign-in (hosted
//! service for authenticated users, local demo persistence otherwise)
//! and never mixes backends within a session.

use crate::error::StoreError;
use crate::fields::UpdateMap;
use crate::snapshot::Subscription;
use async_trait::async_trait;
use snowplan_model::{NewProject, Project, ProjectId};

/// Uniform persistence interface over project documents
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Create a project from a template spec
    ///
    /// Generates the identifier, seeds the step set, and assigns
    /// creation timestamps.
    async fn create(&self, spec: NewProject) -> Result<Project, StoreError>;

    /// Read one project
    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError>;

    /// All projects, most recently updated first
    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// Apply a targeted partial update
    ///
    /// Only the named fields are written; `updated_at` is refreshed as a
    /// side effect of every successful update.
    async fn update(&self, id: &ProjectId, updates: UpdateMap) -> Result<(), StoreError>;

    /// Subscribe to a project's snapshot stream
    async fn subscribe(&self, id: &ProjectId) -> Result<Subscription, StoreError>;

    /// Delete a project and notify its subscribers it is gone
    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError>;
}
