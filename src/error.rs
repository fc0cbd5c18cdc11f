//! Error handling for the Jira/Confluence MCP server
//!
//! One taxonomy covers both transformer components and the REST glue:
//! transient network failures are retryable, not-found is a soft failure
//! for attachment resolution and a hard failure for tree building, and
//! everything else propagates.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the MCP server
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("transient network error: {0}")]
    Transient(#[source] reqwest::Error),

    #[error("http client error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: StatusCode, url: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("malformed diagram macro at offset {offset}: {reason}")]
    MalformedMacro { offset: usize, reason: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Unrecoverable(String),
}

impl Error {
    /// Whether a retry with backoff is worth attempting.
    ///
    /// Covers connect/timeout failures plus 5xx and 429 responses; 4xx
    /// responses other than 429 are treated as permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient(_) => true,
            Error::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::Transient(e)
        } else {
            Error::Request(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let e = Error::Http {
            status: StatusCode::BAD_GATEWAY,
            url: "http://confluence.local/rest/api/content".into(),
        };
        assert!(e.is_transient());

        let e = Error::Http {
            status: StatusCode::TOO_MANY_REQUESTS,
            url: "http://confluence.local/rest/api/content".into(),
        };
        assert!(e.is_transient());
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let e = Error::Http {
            status: StatusCode::FORBIDDEN,
            url: "http://jira.local/rest/api/2/issue/PROJ-1".into(),
        };
        assert!(!e.is_transient());

        let e = Error::NotFound {
            what: "attachment d1.json".into(),
        };
        assert!(!e.is_transient());
        assert!(e.is_not_found());
    }
}
