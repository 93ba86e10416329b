use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use super::{DecodeStep, OperationStatus, PersistStep, Priority, Step, TransportStep};
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::store::RecordStore;
use crate::transport::{NetworkActivity, NoActivity, Transport};
use crate::types::{Record, RecordKind};

/// The single result of a pipeline run.
pub type PipelineResult = Result<Vec<Record>>;

/// Receives a pipeline's result. Called exactly once.
pub type CompletionHandler = Box<dyn FnOnce(PipelineResult) + Send + 'static>;

/// Fetch, decode and (optionally) persist records as one cancellable unit.
///
/// Steps run strictly in order inside the task that drives
/// [`run`](Pipeline::run); the first failure short-circuits the rest.
/// Cancelling the pipeline's [`status`](Pipeline::status) cancels whichever
/// step is active and keeps later steps from starting.
///
/// # Examples
///
/// ```no_run
/// # async fn demo(transport: std::sync::Arc<dyn feedkit::transport::Transport>) {
/// use feedkit::operation::Pipeline;
/// use feedkit::request::ApiRequest;
/// use feedkit::types::RecordKind;
///
/// let result = Pipeline::new(ApiRequest::profile("tok"), RecordKind::Profile, transport)
///     .on_complete(|result| println!("done: {}", result.is_ok()))
///     .run()
///     .await;
/// # }
/// ```
pub struct Pipeline {
    id: Uuid,
    request: ApiRequest,
    kind: RecordKind,
    priority: Priority,
    transport: Arc<dyn Transport>,
    activity: Arc<dyn NetworkActivity>,
    store: Option<Arc<dyn RecordStore>>,
    status: OperationStatus,
    completion: Option<CompletionHandler>,
}

impl Pipeline {
    /// A `Normal` priority pipeline with no store and no completion callback.
    pub fn new(request: ApiRequest, kind: RecordKind, transport: Arc<dyn Transport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            kind,
            priority: Priority::default(),
            transport,
            activity: Arc::new(NoActivity),
            store: None,
            status: OperationStatus::new(),
            completion: None,
        }
    }

    /// Set the scheduling priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Persist decoded records into `store`.
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report network activity to `activity`.
    pub fn with_activity(mut self, activity: Arc<dyn NetworkActivity>) -> Self {
        self.activity = activity;
        self
    }

    /// Register the completion callback, replacing any earlier one.
    pub fn on_complete<F>(mut self, completion: F) -> Self
    where
        F: FnOnce(PipelineResult) + Send + 'static,
    {
        self.completion = Some(Box::new(completion));
        self
    }

    /// Operation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Scheduling priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Record type this pipeline decodes.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The request this pipeline sends.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// The pipeline's status. Clone it to observe or cancel from elsewhere.
    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    /// Run every step, deliver the result to the completion callback, then
    /// mark the pipeline `Finished`.
    ///
    /// The same result is returned to the caller. A panicking callback is
    /// logged and the pipeline still finishes.
    pub async fn run(self) -> PipelineResult {
        let span = tracing::info_span!(
            "pipeline",
            id = %self.id,
            kind = %self.kind,
            priority = %self.priority,
        );
        let Self {
            request,
            kind,
            transport,
            activity,
            store,
            status,
            completion,
            ..
        } = self;

        let outcome = drive(&status, request, kind, transport, activity, store)
            .instrument(span.clone())
            .await;

        span.in_scope(|| {
            match &outcome {
                Ok(records) => tracing::info!(count = records.len(), "Pipeline succeeded"),
                Err(Error::Cancelled) => tracing::debug!("Pipeline cancelled"),
                Err(e) => tracing::warn!(error = %e, kind = %e.kind(), "Pipeline failed"),
            }
            if let Some(completion) = completion {
                let delivered = outcome.clone();
                if panic::catch_unwind(AssertUnwindSafe(move || completion(delivered))).is_err() {
                    tracing::error!("Completion handler panicked");
                }
            }
            status.finish();
        });
        outcome
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("path", &self.request.path())
            .field("persist", &self.store.is_some())
            .field("state", &self.status.state())
            .finish()
    }
}

async fn drive(
    status: &OperationStatus,
    request: ApiRequest,
    kind: RecordKind,
    transport: Arc<dyn Transport>,
    activity: Arc<dyn NetworkActivity>,
    store: Option<Arc<dyn RecordStore>>,
) -> PipelineResult {
    if !status.begin() {
        return Err(Error::Cancelled);
    }

    let tree = TransportStep::new(status.child(), transport, activity, request)
        .start()
        .await?;
    let records = DecodeStep::new(status.child(), tree, kind).start().await?;

    match store {
        Some(store) => PersistStep::new(status.child(), store, records).start().await,
        None => {
            tracing::debug!(count = records.len(), "No store attached, skipping persist");
            Ok(records)
        },
    }
}
