//! Error types for the DKN client
//!
//! Three failure families reach callers:
//! - Network failures (no HTTP status)
//! - HTTP errors (status, parsed body, server message)
//! - Local validation failures, raised before any request is sent
//!
//! Session and configuration errors only surface from the file-backed
//! implementations.

use crate::forms::FieldErrors;
use serde_json::Value;
use std::path::PathBuf;

/// HTTP status the server uses for expired or missing credentials
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status for role-denied actions
pub const STATUS_FORBIDDEN: u16 = 403;

/// HTTP status carrying field-level validation errors
pub const STATUS_UNPROCESSABLE: u16 = 422;

/// Failure classes reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Request exceeded the configured timeout
    Timeout,
    /// Connection could not be established
    Connect,
    /// Malformed URL
    InvalidUrl,
    /// Anything else on the wire
    Other,
}

/// A request that never produced an HTTP response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Failure class
    pub kind: TransportErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl TransportError {
    /// Create transport error
    #[inline]
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// REST call failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Transport failed before a response arrived
    #[error("{0}")]
    Network(String),

    /// Non-2xx response
    #[error("{message}")]
    Http {
        /// HTTP status
        status: u16,
        /// `body.message`, or `API error: <status>`
        message: String,
        /// Parsed body, `Null` when absent or not JSON
        body: Value,
    },

    /// 2xx response whose body does not match the expected record
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Id that cannot be placed in a URL path segment
    #[error("invalid id: {0:?}")]
    InvalidId(String),
}

impl ApiError {
    /// Build the HTTP variant from a status and parsed body
    #[must_use]
    pub fn from_response(status: u16, body: Value) -> Self {
        let message = message_field(&body)
            .map_or_else(|| format!("API error: {status}"), str::to_string);
        ApiError::Http {
            status,
            message,
            body,
        }
    }

    /// HTTP status, `None` for network and decode failures
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed error body
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Check for HTTP 401
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }

    /// Check for HTTP 403
    #[inline]
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(STATUS_FORBIDDEN)
    }

    /// Check for a failure without an HTTP status
    #[inline]
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// `message` field of the error body, if the server sent one
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.body().and_then(message_field)
    }

    /// Server message, else `fallback`
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    /// Server message, else `forbidden` on 403, else `fallback`
    #[must_use]
    pub fn user_message_or_forbidden(&self, forbidden: &str, fallback: &str) -> String {
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        if self.is_forbidden() {
            forbidden.to_string()
        } else {
            fallback.to_string()
        }
    }

    /// Field errors from a 422 body; empty for anything else
    #[must_use]
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            ApiError::Http {
                status: STATUS_UNPROCESSABLE,
                body,
                ..
            } => FieldErrors::from_server(body.get("errors")),
            _ => FieldErrors::default(),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network(err.message)
    }
}

fn message_field(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
}

/// A form that failed local validation; no request was sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{summary}")]
pub struct ValidationError {
    /// Form-level status line
    pub summary: String,
    /// Per-field messages
    pub fields: FieldErrors,
}

impl ValidationError {
    /// Create validation error
    #[must_use]
    pub fn new(summary: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            summary: summary.into(),
            fields,
        }
    }
}

/// Session persistence failure
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Session directory could not be created
    #[error("failed to create session directory '{path}': {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Session file could not be written or removed
    #[error("failed to write session file '{path}': {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Session could not be serialized
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but is unreadable
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Environment variable has an unusable value
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name
        name: String,
        /// What was wrong
        message: String,
    },

    /// API origin is not an http(s) URL
    #[error("invalid API origin '{0}': expected http:// or https://")]
    InvalidOrigin(String),
}

impl ConfigError {
    /// Creates an invalid env var error
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn message_prefers_body() {
        let err = ApiError::from_response(400, json!({"message": "Title taken"}));
        assert_eq!(err.to_string(), "Title taken");

        let err = ApiError::from_response(500, Value::Null);
        assert_eq!(err.to_string(), "API error: 500");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn status_predicates() {
        assert!(ApiError::from_response(401, Value::Null).is_unauthorized());
        assert!(ApiError::from_response(403, Value::Null).is_forbidden());
        let network = ApiError::Network("connection refused".to_string());
        assert!(network.is_network());
        assert_eq!(network.status(), None);
    }

    #[test]
    fn forbidden_fallback_only_without_server_message() {
        let bare = ApiError::from_response(403, json!({}));
        assert_eq!(bare.user_message_or_forbidden("denied", "failed"), "denied");

        let explained = ApiError::from_response(403, json!({"message": "Locked by governance"}));
        assert_eq!(
            explained.user_message_or_forbidden("denied", "failed"),
            "Locked by governance"
        );

        let other = ApiError::from_response(500, Value::Null);
        assert_eq!(other.user_message_or_forbidden("denied", "failed"), "failed");
    }

    #[test]
    fn field_errors_only_for_422() {
        let body = json!({"errors": {"title": ["is required", "too short"]}});
        let err = ApiError::from_response(422, body.clone());
        assert_eq!(err.field_errors().get("title"), Some("is required too short"));

        let err = ApiError::from_response(400, body);
        assert!(err.field_errors().is_empty());
    }

    #[test]
    fn transport_error_becomes_network() {
        let err: ApiError =
            TransportError::new(TransportErrorKind::Connect, "connection refused").into();
        assert_eq!(err, ApiError::Network("connection refused".to_string()));
    }
}
