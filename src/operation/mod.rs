//! Units of work: operation state, the [`Step`] capability and the fetch
//! pipeline built from it.
//!
//! # State Machine
//!
//! ```text
//! Pending -> Running -> Finished
//!    \_____ cancel ______/^
//! ```
//!
//! Every unit of work carries an [`OperationStatus`]: a monotonic
//! [`OperationState`] plus an independent cancellation flag. Cancellation
//! can be requested while `Pending` or `Running`; a unit that observes it
//! jumps straight to `Finished` without doing its work. Once `Finished` the
//! state never changes again and further cancellation requests are ignored.
//!
//! Statuses form a tree: [`OperationStatus::child`] creates a status whose
//! cancellation follows its parent, which is how cancelling a
//! [`Pipeline`] reaches whichever step is active.

mod decode;
mod persist;
mod pipeline;
mod transport;

pub use decode::{decode_records, DecodeStep};
pub use persist::PersistStep;
pub use pipeline::{CompletionHandler, Pipeline, PipelineResult};
pub use transport::TransportStep;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Lifecycle state of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    /// Created, not started.
    Pending,
    /// Doing its work.
    Running,
    /// Done, successfully or not (terminal).
    Finished,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Scheduling priority of a pipeline.
///
/// `Low` and `VeryLow` run on the dispatcher's background lane; everything
/// else runs on the foreground lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    /// Prefetching nobody is waiting for.
    VeryLow,
    /// Background refresh.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// User is waiting.
    High,
    /// User is waiting and nothing else matters.
    VeryHigh,
}

impl Priority {
    /// Returns `true` for priorities routed to the background lane.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedkit::operation::Priority;
    ///
    /// assert!(Priority::Low.is_background());
    /// assert!(Priority::VeryLow.is_background());
    /// assert!(!Priority::Normal.is_background());
    /// assert!(!Priority::VeryHigh.is_background());
    /// ```
    pub fn is_background(&self) -> bool {
        matches!(self, Self::Low | Self::VeryLow)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryLow => write!(f, "very_low"),
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// Shared, observable status of a unit of work.
///
/// Cloning yields another handle to the same status.
///
/// # Examples
///
/// ```
/// use feedkit::operation::{OperationState, OperationStatus};
///
/// let status = OperationStatus::new();
/// assert_eq!(status.state(), OperationState::Pending);
///
/// assert!(status.begin());
/// assert_eq!(status.state(), OperationState::Running);
///
/// assert!(status.finish());
/// assert!(!status.finish()); // only the first call finishes
///
/// status.cancel(); // ignored once finished
/// assert!(!status.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct OperationStatus {
    inner: Arc<StatusInner>,
}

#[derive(Debug)]
struct StatusInner {
    state: watch::Sender<OperationState>,
    cancel: CancellationToken,
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationStatus {
    /// A fresh `Pending`, not-cancelled status.
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    fn with_token(cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(OperationState::Pending);
        Self {
            inner: Arc::new(StatusInner { state, cancel }),
        }
    }

    /// A new `Pending` status cancelled whenever this one is.
    pub fn child(&self) -> Self {
        Self::with_token(self.inner.cancel.child_token())
    }

    /// Current state.
    pub fn state(&self) -> OperationState {
        *self.inner.state.borrow()
    }

    /// Returns `true` once the unit has finished.
    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    /// Returns `true` while the unit is doing its work.
    pub fn is_running(&self) -> bool {
        self.state() == OperationState::Running
    }

    /// Returns `true` if cancellation was requested (here or on a parent).
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Request cancellation. Advisory: the unit notices at its next
    /// checkpoint. No-op once finished.
    ///
    /// The finished check and the cancel happen under the state lock, so a
    /// concurrent [`finish`](Self::finish) either lands first (and the cancel
    /// is dropped) or after the token is already cancelled.
    pub fn cancel(&self) {
        let token = &self.inner.cancel;
        self.inner.state.send_if_modified(|state| {
            if *state != OperationState::Finished {
                token.cancel();
            }
            false
        });
    }

    /// Move `Pending -> Running`.
    ///
    /// Returns `false` without changing state when cancellation was
    /// requested or the unit already left `Pending`; the caller must then
    /// skip its work.
    pub fn begin(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.inner.state.send_if_modified(|state| {
            if *state == OperationState::Pending {
                *state = OperationState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Move to `Finished`. Returns `true` only for the call that did it.
    pub fn finish(&self) -> bool {
        self.inner.state.send_if_modified(|state| {
            if *state == OperationState::Finished {
                false
            } else {
                *state = OperationState::Finished;
                true
            }
        })
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.inner.cancel.cancelled().await;
    }

    /// Resolves once the unit is `Finished`.
    pub async fn wait(&self) {
        let mut rx = self.inner.state.subscribe();
        let _finished = rx
            .wait_for(|state| *state == OperationState::Finished)
            .await
            .is_ok();
    }
}

/// One unit of work inside a pipeline.
///
/// Implementors supply [`execute`](Step::execute); the provided
/// [`start`](Step::start) drives the state machine around it: skip when
/// already cancelled, race the work against cancellation while running,
/// and always end `Finished`.
#[async_trait]
pub trait Step: Send {
    /// What the step produces on success.
    type Output: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The step's status.
    fn status(&self) -> &OperationStatus;

    /// Whether in-flight work is dropped on cancellation. Steps whose work
    /// cannot be interrupted return `false` and only check cancellation
    /// before starting.
    fn abortable(&self) -> bool {
        true
    }

    /// The step's actual work.
    async fn execute(&mut self) -> Result<Self::Output>;

    /// Run the step to completion.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] if cancellation was requested before or (for
    /// abortable steps) during the work; [`Error::InvalidRequest`] if the
    /// step was already started; otherwise whatever
    /// [`execute`](Step::execute) returned.
    async fn start(&mut self) -> Result<Self::Output> {
        let name = self.name();
        let status = self.status().clone();

        if !status.begin() {
            if status.state() != OperationState::Pending {
                tracing::warn!(step = name, state = ?status.state(), "Step started twice");
                return Err(Error::invalid_request(format!("step {name} already started")));
            }
            status.finish();
            tracing::debug!(step = name, "Step cancelled before start");
            return Err(Error::Cancelled);
        }
        tracing::trace!(step = name, "Step started");

        let outcome = if self.abortable() {
            tokio::select! {
                biased;
                () = status.cancelled() => Err(Error::Cancelled),
                outcome = self.execute() => outcome,
            }
        } else {
            self.execute().await
        };
        status.finish();

        match &outcome {
            Ok(_) => tracing::trace!(step = name, "Step finished"),
            Err(Error::Cancelled) => tracing::debug!(step = name, "Step cancelled"),
            Err(e) => tracing::error!(step = name, error = %e, "Step failed"),
        }
        outcome
    }
}
