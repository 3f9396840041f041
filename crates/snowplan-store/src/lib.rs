//! Snowplan store adapter
//!
//! Uniform persistence interface over project documents with two
//! interchangeable backends:
//! - [`RemoteStore`]: hosted document service, server timestamps, push
//!   snapshot delivery
//! - [`DemoStore`]: local JSON persistence, client timestamps, simulated
//!   latency, poll-based snapshot delivery
//!
//! Backend selection is a static, session-wide choice made once at
//! sign-in; callers hold an `Arc<dyn ProjectStore>` and never branch on
//! the backend again.

pub mod adapter;
pub mod demo;
pub mod error;
pub mod fields;
pub mod remote;
pub mod snapshot;

pub use adapter::ProjectStore;
pub use demo::{DemoStore, DemoStoreConfig};
pub use error::StoreError;
pub use fields::{FieldPath, FieldValue, UpdateMap};
pub use remote::RemoteStore;
pub use snapshot::{SnapshotEvent, Subscription};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
