//! # feedkit
//!
//! Client core for a content API: fetch the authenticated user's profile
//! and publications, decode them into typed records and persist them
//! locally, as cancellable, priority-scheduled pipelines.
//!
//! # Overview
//!
//! A [`Pipeline`] sequences three steps:
//!
//! 1. **Transport** -- one HTTP exchange built from an [`ApiRequest`]
//!    (bearer auth, JSON headers) through a shared [`Transport`].
//! 2. **Decode** -- turn the payload under the top-level `data` field into
//!    [`Record`]s.
//! 3. **Persist** -- upsert the records into a [`RecordStore`] as one
//!    atomic batch (optional).
//!
//! Every pipeline delivers exactly one [`PipelineResult`] to its completion
//! callback, including when it fails or is cancelled. The [`Dispatcher`]
//! routes pipelines onto a foreground or background lane by [`Priority`].
//!
//! # Module Organization
//!
//! - [`request`] - Request descriptors and the concrete HTTP request
//! - [`types`] - Profile and publication records
//! - [`transport`] - Network exchange and activity hooks
//! - [`operation`] - Operation state, steps and the pipeline
//! - [`store`] - Record stores
//! - [`dispatcher`] - Priority lanes and operation handles
//! - [`config`] - Client configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use feedkit::store::JsonFileStore;
//! use feedkit::{ClientConfig, Dispatcher, Priority, RecordKind};
//! use feedkit::request::ApiRequest;
//!
//! #[tokio::main]
//! async fn main() -> feedkit::Result<()> {
//!     let config = ClientConfig::from_env();
//!     feedkit::logging::init_logging(&config.log_filter)?;
//!
//!     let store = Arc::new(JsonFileStore::open("records.json")?);
//!     let dispatcher = Dispatcher::from_config(config, store)?;
//!
//!     let profile = dispatcher.fetch_profile("token", |result| {
//!         if let Ok(records) = result {
//!             println!("{:?}", records.first());
//!         }
//!     });
//!
//!     let prefetch = dispatcher.pipeline(
//!         ApiRequest::publications("u1", "token"),
//!         RecordKind::Publication,
//!     );
//!     let background = dispatcher.submit(prefetch.with_priority(Priority::Low));
//!
//!     profile.wait().await;
//!     background.wait().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod operation;
pub mod request;
pub mod store;
pub mod transport;
pub mod types;

pub use config::ClientConfig;
pub use dispatcher::{Dispatcher, Lane, LaneKind, OperationHandle};
pub use error::{Error, ErrorKind, Result, StoreError};
pub use operation::{OperationState, OperationStatus, Pipeline, PipelineResult, Priority};
pub use request::ApiRequest;
pub use store::{BatchReceipt, RecordStore, StoredRecord};
pub use transport::{NetworkActivity, Transport};
pub use types::{Profile, Publication, Record, RecordKind};
