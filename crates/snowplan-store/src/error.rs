//! Store adapter errors

use snowplan_model::TemplateError;

/// Errors surfaced by store backends
///
/// None of these are fatal to the process; all are scoped to one project
/// session.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Project or step key absent
    #[error("project not found")]
    NotFound,

    /// Backend rejected or timed out an update
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Backend error delivered through the snapshot channel
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),

    /// Update map entry did not match the document shape
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// Template could not seed a project
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    /// Local persistence layer failed
    #[error("persistence error: {0}")]
    Persistence(String),
}
