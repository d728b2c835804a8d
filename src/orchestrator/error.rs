// ABOUTME: Orchestrator query error types with SNAFU pattern.
// ABOUTME: Each error carries the failed operation, a kind tag, and its underlying cause.

use snafu::Snafu;
use std::time::Duration;

use super::signing::SigningError;

/// Failure to reach or talk to the orchestrator endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("TLS setup failed: {0}")]
    TlsSetup(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("could not build request: {0}")]
    Request(String),
}

/// A failed orchestrator query.
///
/// Never retried by the code that produced it; callers inspect [`QueryError::kind`]
/// or [`QueryError::is_retriable`] to decide.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueryError {
    #[snafu(display("{operation}: could not reach orchestrator: {source}"))]
    Transport {
        operation: &'static str,
        source: TransportError,
    },

    #[snafu(display("{operation}: {source}"))]
    Signing {
        operation: &'static str,
        source: SigningError,
    },

    #[snafu(display("{operation}: no response within {timeout:?}"))]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[snafu(display("{operation}: orchestrator returned {status} {code}: {message}"))]
    Service {
        operation: &'static str,
        status: u16,
        code: String,
        message: String,
    },

    #[snafu(display("{operation}: could not encode request: {source}"))]
    Encode {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("{operation}: malformed response: {source}"))]
    Decode {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("{operation}: {resource} not found"))]
    NotFound {
        operation: &'static str,
        resource: String,
    },

    /// The call succeeded but the orchestrator refused the item itself.
    #[snafu(display("{operation}: {arn} rejected: {reason}"))]
    Rejected {
        operation: &'static str,
        arn: String,
        reason: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Connection, handshake, or HTTP protocol failure.
    Transport,
    /// No response within the request timeout.
    Timeout,
    /// Credentials missing, expired, or not permitted.
    Auth,
    /// The orchestrator rejected the request.
    Service,
    /// Request or response body could not be (de)serialized.
    Decode,
    /// The cluster, service, or task specification does not exist.
    NotFound,
}

const AUTH_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "ExpiredTokenException",
    "InvalidSignatureException",
];

const NOT_FOUND_CODES: &[&str] = &[
    "ClusterNotFoundException",
    "ServiceNotFoundException",
    "TaskDefinitionNotFoundException",
];

impl QueryError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::Transport { .. } => QueryErrorKind::Transport,
            QueryError::Signing { .. } => QueryErrorKind::Auth,
            QueryError::Timeout { .. } => QueryErrorKind::Timeout,
            QueryError::Service { status, code, .. } => {
                if *status == 401 || *status == 403 || AUTH_CODES.contains(&code.as_str()) {
                    QueryErrorKind::Auth
                } else if NOT_FOUND_CODES.contains(&code.as_str()) {
                    QueryErrorKind::NotFound
                } else {
                    QueryErrorKind::Service
                }
            }
            QueryError::Encode { .. } | QueryError::Decode { .. } => QueryErrorKind::Decode,
            QueryError::NotFound { .. } => QueryErrorKind::NotFound,
            QueryError::Rejected { reason, .. } if reason == "MISSING" => QueryErrorKind::NotFound,
            QueryError::Rejected { .. } => QueryErrorKind::Service,
        }
    }

    /// The orchestrator operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            QueryError::Transport { operation, .. }
            | QueryError::Signing { operation, .. }
            | QueryError::Timeout { operation, .. }
            | QueryError::Service { operation, .. }
            | QueryError::Encode { operation, .. }
            | QueryError::Decode { operation, .. }
            | QueryError::NotFound { operation, .. }
            | QueryError::Rejected { operation, .. } => *operation,
        }
    }

    /// Whether re-issuing the same query later could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            QueryError::Transport { .. } | QueryError::Timeout { .. } => true,
            QueryError::Service { status, code, .. } => {
                *status >= 500 || code == "ThrottlingException"
            }
            _ => false,
        }
    }
}
