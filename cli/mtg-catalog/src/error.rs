//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("request to catalog failed")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// `message` is the server provided message if the body could be
    /// decoded, otherwise the status line (e.g. `404 Not Found`).
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("failed to decode catalog response")]
    Decode(#[source] serde_json::Error),

    #[error("invalid value {value:?} for '{field}': {reason}")]
    Format {
        field: String,
        value: String,
        reason: String,
    },

    /// A lookup expecting exactly one entity got `found` entities.
    #[error("{resource} '{key}' not found")]
    NotFound {
        resource: &'static str,
        key: String,
        found: usize,
    },

    #[error("invalid catalog url")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

/// Error body returned by the catalog for failed requests.
///
/// The status is reported as a string by the service,
/// but is only carried for logging.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) status: Option<serde_json::Value>,
    #[serde(rename = "error", alias = "message")]
    pub(crate) message: String,
}

impl CatalogClientError {
    /// Build a [CatalogClientError::Server] from a failed response body.
    ///
    /// Falls back to the status line if the body is not an error envelope.
    pub(crate) fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(ErrorBody {
                status: reported,
                message,
            }) => {
                tracing::debug!(%status, ?reported, %message, "catalog reported an error");
                CatalogClientError::Server { status, message }
            },
            Err(err) => {
                tracing::debug!(%status, %err, "could not decode error response");
                CatalogClientError::Server {
                    status,
                    message: status_line(status),
                }
            },
        }
    }
}

/// `404 Not Found`, or just the code if it has no registered reason.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}
