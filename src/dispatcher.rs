//! Priority-routed execution of fetch pipelines.
//!
//! The [`Dispatcher`] owns two lanes, each a semaphore bounding how many
//! pipelines run at once. `Low` and `VeryLow` priority pipelines go to the
//! background lane; `Normal`, `High` and `VeryHigh` go to the foreground
//! lane. Submitting never blocks the caller: the pipeline is spawned on the
//! dispatcher's runtime and waits for a lane permit there.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use feedkit::store::MemoryStore;
//! use feedkit::{ClientConfig, Dispatcher};
//!
//! # async fn demo() -> feedkit::Result<()> {
//! let dispatcher = Dispatcher::from_config(ClientConfig::default(), Arc::new(MemoryStore::new()))?;
//! let handle = dispatcher.fetch_profile("token", |result| match result {
//!     Ok(records) => println!("fetched {} records", records.len()),
//!     Err(e) => eprintln!("fetch failed: {e}"),
//! });
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::operation::{OperationState, OperationStatus, Pipeline, PipelineResult, Priority};
use crate::request::ApiRequest;
use crate::store::RecordStore;
use crate::transport::{NetworkActivity, NoActivity, Transport};
use crate::types::RecordKind;

/// Which lane a pipeline runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// User-facing work.
    Foreground,
    /// Refreshes and prefetches.
    Background,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// A concurrency-bounded execution lane.
#[derive(Debug, Clone)]
pub struct Lane {
    kind: LaneKind,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl Lane {
    fn new(kind: LaneKind, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Lane kind.
    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    /// Maximum number of pipelines running at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by a running pipeline.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Caller's view of a submitted pipeline.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    id: Uuid,
    priority: Priority,
    lane: LaneKind,
    status: OperationStatus,
}

impl OperationHandle {
    /// Operation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Priority the pipeline was submitted with.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Lane the pipeline was routed to.
    pub fn lane(&self) -> LaneKind {
        self.lane
    }

    /// Current state.
    pub fn state(&self) -> OperationState {
        self.status.state()
    }

    /// Returns `true` once the completion callback has run.
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Returns `true` if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Request cancellation. The pipeline notices at its next checkpoint
    /// and reports `Err(Error::Cancelled)` through its callback.
    pub fn cancel(&self) {
        self.status.cancel();
    }

    /// Resolves once the pipeline is `Finished`.
    pub async fn wait(&self) {
        self.status.wait().await;
    }
}

/// Routes pipelines onto priority lanes and tracks them until they finish.
pub struct Dispatcher {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn RecordStore>,
    activity: Arc<dyn NetworkActivity>,
    foreground: Lane,
    background: Lane,
    runtime: Handle,
    in_flight: Arc<DashMap<Uuid, OperationStatus>>,
}

impl Dispatcher {
    /// Create a dispatcher on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `config` is invalid or no runtime is running.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::config(format!("dispatcher needs a tokio runtime: {e}")))?;

        tracing::debug!(
            api_server = %config.api_server,
            foreground = config.foreground_concurrency,
            background = config.background_concurrency,
            "Creating dispatcher"
        );
        Ok(Self {
            foreground: Lane::new(LaneKind::Foreground, config.foreground_concurrency),
            background: Lane::new(LaneKind::Background, config.background_concurrency),
            config,
            transport,
            store,
            activity: Arc::new(NoActivity),
            runtime,
            in_flight: Arc::new(DashMap::new()),
        })
    }

    /// Create a dispatcher using an [`HttpTransport`](crate::transport::HttpTransport)
    /// built from `config`.
    #[cfg(feature = "http-client")]
    pub fn from_config(config: ClientConfig, store: Arc<dyn RecordStore>) -> Result<Self> {
        let transport = crate::transport::HttpTransport::from_config(&config)?;
        Self::new(config, Arc::new(transport), store)
    }

    /// Report network activity of every pipeline to `activity`.
    pub fn with_activity(mut self, activity: Arc<dyn NetworkActivity>) -> Self {
        self.activity = activity;
        self
    }

    /// Spawn pipelines on `runtime` instead of the one `new` was called on.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = runtime;
        self
    }

    /// The dispatcher's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared store pipelines persist into.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// A persisting pipeline for `request` against the configured server.
    ///
    /// Adjust it (priority, callback) and hand it to [`submit`](Self::submit).
    pub fn pipeline(&self, request: ApiRequest, kind: RecordKind) -> Pipeline {
        Pipeline::new(
            request.with_base_url(self.config.api_server.clone()),
            kind,
            self.transport.clone(),
        )
        .with_store(self.store.clone())
        .with_activity(self.activity.clone())
    }

    /// Fetch and persist the authenticated user's profile.
    pub fn fetch_profile<F>(&self, access_token: &str, completion: F) -> OperationHandle
    where
        F: FnOnce(PipelineResult) + Send + 'static,
    {
        let pipeline = self
            .pipeline(ApiRequest::profile(access_token), RecordKind::Profile)
            .on_complete(completion);
        self.submit(pipeline)
    }

    /// Fetch and persist the publications of `user_id`.
    pub fn fetch_publications<F>(
        &self,
        user_id: &str,
        access_token: &str,
        completion: F,
    ) -> OperationHandle
    where
        F: FnOnce(PipelineResult) + Send + 'static,
    {
        let pipeline = self
            .pipeline(
                ApiRequest::publications(user_id, access_token),
                RecordKind::Publication,
            )
            .on_complete(completion);
        self.submit(pipeline)
    }

    /// Route `pipeline` to its lane and start it.
    pub fn submit(&self, pipeline: Pipeline) -> OperationHandle {
        let id = pipeline.id();
        let priority = pipeline.priority();
        let lane = self.lane_for(priority);
        let status = pipeline.status().clone();

        self.in_flight.insert(id, status.clone());
        tracing::debug!(%id, %priority, lane = %lane.kind, "Submitting pipeline");

        let permits = lane.permits.clone();
        let gate = status.clone();
        let in_flight = self.in_flight.clone();
        self.runtime.spawn(async move {
            // A pipeline cancelled while queued skips the wait and reports
            // cancellation straight away.
            let permit = tokio::select! {
                biased;
                () = gate.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };
            let _ = pipeline.run().await;
            drop(permit);
            in_flight.remove(&id);
        });

        OperationHandle {
            id,
            priority,
            lane: lane.kind,
            status,
        }
    }

    /// Lane serving `priority`.
    pub fn lane_for(&self, priority: Priority) -> &Lane {
        if priority.is_background() {
            &self.background
        } else {
            &self.foreground
        }
    }

    /// Number of submitted pipelines that have not finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Cancel every pipeline that has not finished. Returns how many were
    /// asked to cancel.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for entry in self.in_flight.iter() {
            let status = entry.value();
            if !status.is_finished() {
                status.cancel();
                cancelled += 1;
            }
        }
        tracing::info!(count = cancelled, "Cancelled in-flight operations");
        cancelled
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("foreground", &self.foreground)
            .field("background", &self.background)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpRequest;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Empty;

    #[async_trait]
    impl Transport for Empty {
        async fn send(&self, request: HttpRequest) -> Result<Value> {
            assert_eq!(request.url.host_str(), Some("feeds.test"));
            Ok(json!({"data": []}))
        }
    }

    fn dispatcher() -> Dispatcher {
        let config = ClientConfig::default()
            .with_api_server("https://feeds.test")
            .with_concurrency(3, 0);
        Dispatcher::new(config, Arc::new(Empty), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn routes_by_priority() {
        let dispatcher = dispatcher();
        for priority in [Priority::VeryLow, Priority::Low] {
            assert_eq!(dispatcher.lane_for(priority).kind(), LaneKind::Background);
        }
        for priority in [Priority::Normal, Priority::High, Priority::VeryHigh] {
            assert_eq!(dispatcher.lane_for(priority).kind(), LaneKind::Foreground);
        }
    }

    #[tokio::test]
    async fn lane_capacity_is_at_least_one() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.lane_for(Priority::Normal).capacity(), 3);
        assert_eq!(dispatcher.lane_for(Priority::Low).capacity(), 1);
    }

    #[tokio::test]
    async fn pipeline_uses_configured_server() {
        let dispatcher = dispatcher();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = dispatcher.fetch_publications("u1", "tok", move |result| {
            let _ = tx.send(result);
        });
        assert_eq!(handle.lane(), LaneKind::Foreground);
        handle.wait().await;
        assert!(rx.await.unwrap().unwrap().is_empty());
        assert_eq!(handle.state(), OperationState::Finished);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn new_without_runtime_fails() {
        let err = Dispatcher::new(
            ClientConfig::default(),
            Arc::new(Empty),
            Arc::new(MemoryStore::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = ClientConfig::default().with_timeout(0);
        assert!(Dispatcher::new(config, Arc::new(Empty), Arc::new(MemoryStore::new())).is_err());
    }
}
