//! `reqwest`-backed [`Transport`].

use async_trait::async_trait;
use serde_json::Value;

use super::{parse_body, Transport};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::request::HttpRequest;

/// Longest response body excerpt kept on an [`Error::Status`].
const MAX_ERROR_BODY: usize = 512;

/// HTTP transport sharing one connection pool across all pipelines.
///
/// # Examples
///
/// ```no_run
/// use feedkit::transport::HttpTransport;
/// use feedkit::ClientConfig;
///
/// let transport = HttpTransport::from_config(&ClientConfig::default()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the timeout and user agent from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::transport(format!("request timed out: {e}"))
            } else {
                Error::transport(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let mut body = String::from_utf8_lossy(&bytes).into_owned();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            tracing::warn!(status = status.as_u16(), "Server returned error status");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(bytes = bytes.len(), "Received response body");
        parse_body(&bytes)
    }
}
