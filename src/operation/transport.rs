use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{OperationStatus, Step};
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::transport::{NetworkActivity, Transport};

/// Performs exactly one network exchange for one request descriptor.
///
/// The descriptor is resolved into a concrete request when the step runs.
/// While the exchange is in flight the [`NetworkActivity`] hook is on; it is
/// switched off exactly once when the exchange ends, fails or is aborted.
pub struct TransportStep {
    status: OperationStatus,
    transport: Arc<dyn Transport>,
    activity: Arc<dyn NetworkActivity>,
    request: Option<ApiRequest>,
}

impl TransportStep {
    /// Create a step that will send `request` through `transport`.
    pub fn new(
        status: OperationStatus,
        transport: Arc<dyn Transport>,
        activity: Arc<dyn NetworkActivity>,
        request: ApiRequest,
    ) -> Self {
        Self {
            status,
            transport,
            activity,
            request: Some(request),
        }
    }
}

impl std::fmt::Debug for TransportStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportStep")
            .field("status", &self.status.state())
            .field("path", &self.request.as_ref().map(ApiRequest::path))
            .finish()
    }
}

/// Switches network activity off when dropped, including when the
/// exchange future is dropped by cancellation.
struct ActivityGuard(Arc<dyn NetworkActivity>);

impl ActivityGuard {
    fn on(activity: Arc<dyn NetworkActivity>) -> Self {
        activity.set_active(true);
        Self(activity)
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.set_active(false);
    }
}

#[async_trait]
impl Step for TransportStep {
    type Output = Value;

    fn name(&self) -> &'static str {
        "transport"
    }

    fn status(&self) -> &OperationStatus {
        &self.status
    }

    async fn execute(&mut self) -> Result<Value> {
        let descriptor = self
            .request
            .take()
            .ok_or_else(|| Error::invalid_request("request already sent"))?;
        let request = descriptor.build()?;

        let _activity = ActivityGuard::on(self.activity.clone());
        match self.transport.send(request).await {
            Ok(tree) => Ok(tree),
            Err(e) => {
                tracing::error!(error = %e, "Error fetching JSON from API server");
                Err(e)
            },
        }
    }
}
