//! Error types for feedkit operations.
//!
//! Every step of a fetch pipeline owns detection of one class of failure.
//! [`Error`] carries the concrete failure, [`ErrorKind`] groups the
//! variants into the taxonomy callers branch on (transport, decode, store,
//! cancellation). Errors only ever reach a caller through a pipeline's
//! completion callback or the value returned by
//! [`Pipeline::run`](crate::operation::Pipeline::run).
//!
//! # Examples
//!
//! ```
//! use feedkit::{Error, ErrorKind};
//!
//! let err = Error::decode("imageUrl", "missing required field");
//! assert_eq!(err.kind(), ErrorKind::Decode);
//! assert!(err.to_string().contains("imageUrl"));
//!
//! assert!(Error::Cancelled.is_cancelled());
//! ```

use std::fmt;

use thiserror::Error as ThisError;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building, fetching, decoding or persisting records.
///
/// `Error` is `Clone` so one pipeline outcome can be logged and delivered
/// without re-running anything.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// The request descriptor could not be turned into a concrete request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection-level failure (refused, reset, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(String),

    /// A record could not be decoded from the structured response.
    #[error("failed to decode field `{field}`: {message}")]
    Decode {
        /// The field path that failed.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The local store rejected a batch write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation was cancelled before it could finish.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request could not be built.
    Request,
    /// Network exchange failed or returned a non-success status.
    Transport,
    /// The response body or one of its records was malformed.
    Decode,
    /// Persisting the decoded records failed.
    Store,
    /// Expected early termination, not a real failure.
    Cancelled,
    /// Bad configuration.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Transport => write!(f, "transport"),
            Self::Decode => write!(f, "decode"),
            Self::Store => write!(f, "store"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Config => write!(f, "config"),
        }
    }
}

impl Error {
    /// Create an [`Error::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an [`Error::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an [`Error::Decode`] for the given field path.
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Maps this error onto the coarse taxonomy.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedkit::{Error, ErrorKind};
    ///
    /// let err = Error::Status { status: 503, body: String::new() };
    /// assert_eq!(err.kind(), ErrorKind::Transport);
    ///
    /// let err = Error::MalformedBody("expected value".to_string());
    /// assert_eq!(err.kind(), ErrorKind::Decode);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::Request,
            Self::Transport(_) | Self::Status { .. } => ErrorKind::Transport,
            Self::MalformedBody(_) | Self::Decode { .. } => ErrorKind::Decode,
            Self::Store(_) => ErrorKind::Store,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised by a [`RecordStore`](crate::store::RecordStore) backend.
///
/// A failed batch is never partially visible; the store reports the
/// failure and keeps its previous contents.
#[derive(Debug, Clone, ThisError)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(String),

    /// Records could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("store backend error: {message}")]
    Backend {
        /// Human-readable description.
        message: String,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = Error::decode("data.username", "missing required field");
        assert_eq!(
            err.to_string(),
            "failed to decode field `data.username`: missing required field"
        );

        let err = Error::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "server returned status 401");

        let err = Error::from(StoreError::Backend {
            message: "disk full".to_string(),
        });
        assert_eq!(err.to_string(), "store backend error: disk full");
    }

    #[test]
    fn error_kinds() {
        assert_eq!(Error::invalid_request("x").kind(), ErrorKind::Request);
        assert_eq!(Error::transport("reset").kind(), ErrorKind::Transport);
        assert_eq!(Error::decode("id", "x").kind(), ErrorKind::Decode);
        assert_eq!(
            Error::Store(StoreError::Io("x".to_string())).kind(),
            ErrorKind::Store
        );
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
    }

    #[test]
    fn only_cancelled_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::transport("timeout").is_cancelled());
    }

    #[test]
    fn store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::from(io);
        assert!(matches!(err, StoreError::Io(ref msg) if msg.contains("denied")));
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Transport.to_string(), "transport");
        assert_eq!(ErrorKind::Cancelled.to_string(), "cancelled");
    }
}
