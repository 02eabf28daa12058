//! A single node endpoint.
//!
//! # Responsibilities
//! - Own one persistent HTTP session per node
//! - Issue exactly one request and normalize the outcome
//! - Map non-2xx answers onto typed errors, keep connectivity failures distinct

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::net::node::{Headers, NodeDescriptor};
use crate::transport::error::{TransportError, TransportResult};

/// A request against a node, relative to the node endpoint.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: Option<String>,
    params: Vec<(String, String)>,
    json: Option<Value>,
    headers: Headers,
    timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path: None,
            params: Vec::new(),
            json: None,
            headers: Headers::new(),
            timeout: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Path appended to the node endpoint, e.g. `/api/v1/transactions/`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn param_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Overall time budget for this request across all nodes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_str(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn body(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn header_map(&self) -> &Headers {
        &self.headers
    }

    pub fn timeout_budget(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Outcome of a successful (2xx) request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or the raw body as a JSON string when the
    /// response is not JSON.
    pub data: Value,
}

/// HTTP session bound to one node endpoint.
#[derive(Debug)]
pub struct Connection {
    endpoint: String,
    client: Client,
}

impl Connection {
    /// Create a session for `node`. Node headers are sent with every request.
    pub fn new(node: &NodeDescriptor) -> TransportResult<Self> {
        let client = Client::builder()
            .default_headers(to_header_map(&node.headers)?)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            endpoint: node.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL for a request path.
    pub fn url_for(&self, path: Option<&str>) -> String {
        match path {
            Some(path) if !path.is_empty() => format!("{}{}", self.endpoint, path),
            _ => self.endpoint.clone(),
        }
    }

    /// Perform exactly one HTTP request.
    ///
    /// `timeout` bounds this single attempt. Connectivity problems, including
    /// an attempt timing out, surface as [`TransportError::Connection`].
    pub async fn request(&self, request: &Request, timeout: Option<Duration>) -> TransportResult<HttpResponse> {
        let url = self.url_for(request.path_str());

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }
        if !request.headers.is_empty() {
            builder = builder.headers(to_header_map(&request.headers)?);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| TransportError::Connection {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        let text = response
            .text()
            .await
            .map_err(|source| TransportError::Connection {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            let info = serde_json::from_str::<Value>(&text).ok();
            tracing::debug!(url = %url, status = status.as_u16(), "node answered with error status");
            return Err(TransportError::from_status(status.as_u16(), text, info, url));
        }

        let parsed = if is_json {
            serde_json::from_str::<Value>(&text).ok()
        } else {
            None
        };
        let data = parsed.unwrap_or(Value::String(text));

        Ok(HttpResponse { status, headers, data })
    }
}

fn to_header_map(headers: &Headers) -> TransportResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}
