//! Network collaborators.
//!
//! A [`Transport`] performs one request/response exchange and returns the
//! response body as a JSON tree. It is shared between every in-flight
//! pipeline, so implementations must be safe for concurrent use.
//! Cancelling an exchange is done by dropping the future returned by
//! [`Transport::send`].
//!
//! [`NetworkActivity`] is an optional platform hook (a status-bar spinner,
//! a metrics gauge) told when an exchange starts and stops.

#[cfg(feature = "http-client")]
mod client;

#[cfg(feature = "http-client")]
pub use self::client::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::request::HttpRequest;

/// Single-exchange network primitive.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and parse the response body.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`](crate::Error::Transport) on connection
    ///   failures and timeouts.
    /// - [`Error::Status`](crate::Error::Status) on a non-2xx response.
    /// - [`Error::MalformedBody`](crate::Error::MalformedBody) when the body
    ///   is not JSON.
    async fn send(&self, request: HttpRequest) -> Result<Value>;
}

/// Receives "network busy" signals from transport steps.
///
/// Every started transport step calls `set_active(true)` once and
/// `set_active(false)` once, in that order.
pub trait NetworkActivity: Send + Sync {
    /// Turn the activity signal on or off.
    fn set_active(&self, active: bool);
}

/// [`NetworkActivity`] that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActivity;

impl NetworkActivity for NoActivity {
    fn set_active(&self, _active: bool) {}
}

/// Parse a response body. An empty body is treated as `null`.
pub(crate) fn parse_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| crate::Error::MalformedBody(e.to_string()))
}
