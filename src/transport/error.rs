//! Transport error taxonomy.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::net::node::NodeError;

/// Details of a non-2xx answer from a node.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub message: String,
    /// Response body parsed as JSON, when it was JSON.
    pub info: Option<Value>,
    /// URL of the failed request.
    pub url: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.status, self.url)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Errors surfaced by a connection or the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The node could not be reached, or the attempt timed out.
    #[error("connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bad request: {0}")]
    BadRequest(HttpError),

    #[error("not found: {0}")]
    NotFound(HttpError),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(HttpError),

    #[error("gateway timeout: {0}")]
    GatewayTimeout(HttpError),

    /// Any other non-2xx status.
    #[error("unexpected status: {0}")]
    Status(HttpError),

    /// The time budget ran out. Carries every connectivity error seen.
    #[error("request timed out after {} failed attempt(s)", .errors.len())]
    Timeout { errors: Vec<TransportError> },

    #[error(transparent)]
    InvalidNode(#[from] NodeError),

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("at least one node is required")]
    NoNodes,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    /// Map a non-2xx status onto its error kind.
    pub fn from_status(status: u16, message: String, info: Option<Value>, url: String) -> Self {
        let error = HttpError {
            status,
            message,
            info,
            url,
        };
        match status {
            400 => TransportError::BadRequest(error),
            404 => TransportError::NotFound(error),
            503 => TransportError::ServiceUnavailable(error),
            504 => TransportError::GatewayTimeout(error),
            _ => TransportError::Status(error),
        }
    }

    /// HTTP details when the node answered with an error status.
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            TransportError::BadRequest(e)
            | TransportError::NotFound(e)
            | TransportError::ServiceUnavailable(e)
            | TransportError::GatewayTimeout(e)
            | TransportError::Status(e) => Some(e),
            _ => None,
        }
    }

    /// JSON body of an HTTP error answer.
    pub fn info(&self) -> Option<&Value> {
        self.http().and_then(|e| e.info.as_ref())
    }

    /// URL of the failed request, when the error concerns one.
    pub fn url(&self) -> Option<&str> {
        match self {
            TransportError::Connection { url, .. } => Some(url),
            other => other.http().map(|e| e.url.as_str()),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.http().map(|e| e.status)
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn err(status: u16) -> TransportError {
        TransportError::from_status(status, "body".into(), None, "http://n:9984/x".into())
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(err(400), TransportError::BadRequest(_)));
        assert!(matches!(err(404), TransportError::NotFound(_)));
        assert!(matches!(err(503), TransportError::ServiceUnavailable(_)));
        assert!(matches!(err(504), TransportError::GatewayTimeout(_)));
        assert!(matches!(err(500), TransportError::Status(_)));
        assert!(matches!(err(418), TransportError::Status(_)));
    }

    #[test]
    fn test_http_details_preserved() {
        let error = TransportError::from_status(
            404,
            r#"{"message":"Not found"}"#.into(),
            Some(json!({"message": "Not found"})),
            "http://n:9984/api/v1/transactions/abc".into(),
        );
        let http = error.http().unwrap();
        assert_eq!(http.status, 404);
        assert_eq!(http.info.as_ref().unwrap()["message"], "Not found");
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.info().unwrap()["message"], "Not found");
        assert_eq!(error.url(), Some("http://n:9984/api/v1/transactions/abc"));
        assert!(error.to_string().contains("/api/v1/transactions/abc"));
        assert!(!error.is_connection());
    }

    #[test]
    fn test_timeout_display_counts_attempts() {
        let timeout = TransportError::Timeout {
            errors: vec![err(503), err(503)],
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.to_string(), "request timed out after 2 failed attempt(s)");
        assert_eq!(timeout.status_code(), None);
    }
}
