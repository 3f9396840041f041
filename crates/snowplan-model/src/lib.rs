//! Snowplan domain model
//!
//! The document types shared by the store adapter and the sync engine:
//! - Project and step identifiers
//! - Projects and their ordered step sets
//! - The built-in template catalog
//! - Derived-field computation (completion, word counts)
//!
//! Derived fields are never written directly: [`Step::set_content`] is the
//! only mutation path for step text, and it recomputes `completed` and
//! `word_count` in the same call.

pub mod ids;
pub mod project;
pub mod step;
pub mod template;

pub use ids::{ProjectId, StepKey};
pub use project::{NewProject, Project};
pub use step::{word_count, Step};
pub use template::{Template, TemplateError, TemplateStep};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
