//! Error types for the push API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers (and `is_valid`)
//! distinguish "the resource does not exist" from "the server returned an
//! unexpected status." All other non-2xx responses land in `HttpError` with
//! the raw status code and body. When the provider sent its structured
//! `errors` body it is attached as `ProviderError` detail on either variant;
//! it never changes which variant is returned.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;
use crate::validation::ValidationError;

/// Errors returned by `OneSignalClient` and `OneSignal` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input was rejected before any request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The transport could not complete the exchange.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 404.
    #[error("resource not found{}", detail(.provider))]
    NotFound { provider: Option<ProviderError> },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError {
        status: u16,
        body: String,
        provider: Option<ProviderError>,
    },
}

impl ApiError {
    /// HTTP status of the failed exchange, if one completed.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<&ProviderError> {
        match self {
            ApiError::NotFound { provider } | ApiError::HttpError { provider, .. } => provider.as_ref(),
            _ => None,
        }
    }
}

fn detail(provider: &Option<ProviderError>) -> String {
    match provider {
        Some(provider) => format!(": {provider}"),
        None => String::new(),
    }
}

/// The provider's own error report, taken from the `errors` member of a
/// non-2xx body. It is either a list of messages or an object keyed by
/// problem (e.g. `invalid_player_ids`); objects are flattened to
/// `key: value` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub errors: Vec<String>,
}

impl ProviderError {
    pub fn from_body(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let errors = match value.get("errors")? {
            Value::Array(items) => items.iter().map(text).collect(),
            Value::Object(map) => map.iter().map(|(key, v)| format!("{key}: {}", text(v))).collect(),
            other => vec![text(other)],
        };
        Some(Self { errors })
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
