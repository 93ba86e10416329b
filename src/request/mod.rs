//! Request descriptors and concrete HTTP requests.
//!
//! An [`ApiRequest`] is an immutable description of one API call. Calling
//! [`ApiRequest::build`] resolves it into an [`HttpRequest`] that a
//! [`Transport`](crate::transport::Transport) can send. Building always
//! injects the bearer token and the JSON content headers; those injected
//! values win over any descriptor header with the same name.

mod body;
mod endpoints;

pub use body::HttpBody;

use std::collections::HashMap;
use std::fmt;

use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::config::DEFAULT_API_SERVER;
use crate::error::{Error, Result};

/// Media type for every request and response body.
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP methods understood by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// The upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Patch => http::Method::PATCH,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

/// Immutable description of one API call.
///
/// # Examples
///
/// ```
/// use feedkit::request::{ApiRequest, HttpMethod};
///
/// let request = ApiRequest::new("/v1/me", "tok")
///     .with_base_url("https://api.example.com")
///     .with_parameter("format", "json");
///
/// let http = request.build().unwrap();
/// assert_eq!(http.method, http::Method::GET);
/// assert_eq!(http.url.path(), "/v1/me");
/// assert_eq!(http.headers["authorization"], "Bearer tok");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    base_url: String,
    method: HttpMethod,
    path: String,
    parameters: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<HttpBody>,
    access_token: String,
}

impl ApiRequest {
    /// Describe a `GET` of `path` against the default API server.
    pub fn new(path: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_SERVER.to_string(),
            method: HttpMethod::Get,
            path: path.into(),
            parameters: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            access_token: access_token.into(),
        }
    }

    /// Resolve against a different server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a different HTTP method.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a query parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Add a request header. `Authorization`, `Accept` and `Content-Type`
    /// are always overwritten by [`build`](Self::build).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: HttpBody) -> Self {
        self.body = Some(body);
        self
    }

    /// The server the path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The path appended to the base URL's path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters, in no particular order.
    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Descriptor-supplied headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The optional body.
    pub fn body(&self) -> Option<&HttpBody> {
        self.body.as_ref()
    }

    /// The bearer token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Produce the concrete request.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] if the base URL does not parse or cannot
    /// carry a path, or if a header name or value is not valid HTTP.
    pub fn build(&self) -> Result<HttpRequest> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_request(format!("invalid base URL {}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "base URL {} cannot carry a path",
                self.base_url
            )));
        }

        let joined = format!("{}{}", url.path().trim_end_matches('/'), self.path);
        url.set_path(&joined);

        if !self.parameters.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_request(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_request(format!("invalid header value for {name}: {e}")))?;
            headers.insert(name, value);
        }

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
            .map_err(|e| Error::invalid_request(format!("invalid access token: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        let body = self.body.as_ref().map(HttpBody::encode).transpose()?;

        Ok(HttpRequest {
            method: self.method.into(),
            url,
            headers,
            body,
        })
    }
}

/// A fully formed request, ready to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: http::Method,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Headers, including the injected authorization and content headers.
    pub headers: HeaderMap,
    /// Encoded JSON body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Query pairs of the URL, decoded.
    pub fn query_pairs(&self) -> HashMap<String, String> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}
