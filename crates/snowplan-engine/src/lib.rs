//! Snowplan sync engine
//!
//! Optimistic local-first synchronization for step-structured writing
//! projects:
//! - **Ordering engine**: new total order after a drag gesture
//! - **Mutation coalescer**: debounced, sequenced field writes
//! - **Snapshot reconciler**: merges remote snapshots without
//!   regressing optimistic local state
//! - **Project session**: the context object owning one project's
//!   cache, subscription, and teardown
//!
//! # Example
//!
//! ```rust,ignore
//! use snowplan_engine::{ProjectSession, SessionConfig};
//! use snowplan_model::{NewProject, Template};
//! use snowplan_store::RemoteStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RemoteStore::connect());
//! let spec = NewProject::new("My Epic Novel", Template::basic().clone());
//! let (session, mut events) = ProjectSession::create(store, spec, SessionConfig::new()).await?;
//!
//! session.edit_content(&"summary".into(), "A hero rises.")?;
//! while let Some(event) = events.recv().await {
//!     // render
//! }
//! # Ok(())
//! # }
//! ```

mod coalescer;
pub mod config;
pub mod error;
pub mod events;
pub mod order;
pub mod reconcile;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use events::{FieldRef, SaveState, SessionEvent};
pub use order::{reorder, EdgeHint};
pub use session::ProjectSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
