//! Azure REST error handling.
//!
//! Azure services report failures as `{ "error": { "code", "message" } }`.
//! [`AzureError`] keeps the HTTP status and that code so the adapters can
//! translate into the store/issuer error kinds.

use keyseed_core::{IssuerError, StoreError};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AzureError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} ({code}): {message}")]
    Status {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// Token acquisition failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A success response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// Credentials or endpoints are missing or malformed.
    #[error("Invalid Azure configuration: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl AzureError {
    /// Builds a `Status` error from a failed response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self::Status {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => Self::Status {
                status,
                code: String::new(),
                message: body.to_string(),
            },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } if !code.is_empty() => Some(code),
            _ => None,
        }
    }

    fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth(_))
            || self
                .status()
                .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }

    fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            _ => false,
        }
    }

    /// Translates into a store error; `vault_name`/`secret_name` fill `NotFound`.
    pub fn into_store_error(self, vault_name: &str, secret_name: &str) -> StoreError {
        if self.status() == Some(StatusCode::NOT_FOUND) || self.code() == Some("SecretNotFound") {
            StoreError::not_found(vault_name, secret_name)
        } else if self.is_unauthorized() {
            StoreError::unauthorized(self.to_string())
        } else if self.is_transient() {
            StoreError::transient(self.to_string())
        } else {
            StoreError::unknown(self.to_string())
        }
    }

    pub fn into_issuer_error(self) -> IssuerError {
        if self.is_unauthorized() {
            IssuerError::unauthorized(self.to_string())
        } else {
            IssuerError::unknown(self.to_string())
        }
    }
}

/// Reads a response, returning the body text on success.
///
/// A body that cannot be read fully is an error even on a success status.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, AzureError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(AzureError::from_response(status, &body));
    }
    Ok(body)
}

/// Reads and parses a JSON response.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, AzureError> {
    let body = read_body(resp).await?;
    serde_json::from_str(&body).map_err(|e| AzureError::Parse(e.to_string()))
}
