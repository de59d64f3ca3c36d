// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error taxonomy.
//!
//! Every failure surfaced by the session and request layers is one of these
//! variants. Response bodies are carried through untouched so callers can
//! render whatever the backend said.

use http::StatusCode;

use crate::config::ConfigError;

/// Classification attached to every [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StateMismatch,
    ExchangeFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    ClientTransportError,
    Unknown,
    StreamTerminated,
    Storage,
    Config,
}

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Unauthorized - please login again")]
    Unauthorized { body: String },

    #[error("Forbidden - you do not have permission")]
    Forbidden { body: String },

    #[error("Resource not found")]
    NotFound { body: String },

    #[error("Server error: HTTP {status}")]
    ServerError { status: u16, body: String },

    #[error("Transport error: {0}")]
    ClientTransportError(String),

    #[error("Unexpected response (status {status:?})")]
    Unknown { status: Option<u16>, body: String },

    #[error("Live update stream terminated: {0}")]
    StreamTerminated(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Classify a non-success response status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => ClientError::Unauthorized { body },
            403 => ClientError::Forbidden { body },
            404 => ClientError::NotFound { body },
            s @ 500..=599 => ClientError::ServerError { status: s, body },
            s => ClientError::Unknown {
                status: Some(s),
                body,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::StateMismatch => ErrorKind::StateMismatch,
            ClientError::ExchangeFailed(_) => ErrorKind::ExchangeFailed,
            ClientError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ClientError::Forbidden { .. } => ErrorKind::Forbidden,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::ServerError { .. } => ErrorKind::ServerError,
            ClientError::ClientTransportError(_) => ErrorKind::ClientTransportError,
            ClientError::Unknown { .. } => ErrorKind::Unknown,
            ClientError::StreamTerminated(_) => ErrorKind::StreamTerminated,
            ClientError::Storage(_) => ErrorKind::Storage,
            ClientError::Config(_) => ErrorKind::Config,
        }
    }

    /// Response body attached to the error, if the backend sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { body }
            | ClientError::Forbidden { body }
            | ClientError::NotFound { body }
            | ClientError::ServerError { body, .. }
            | ClientError::Unknown { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Errors handled by the session layer rather than the calling view.
    pub fn affects_session(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::StateMismatch | ErrorKind::ExchangeFailed | ErrorKind::Unauthorized
        )
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (500, ErrorKind::ServerError),
            (503, ErrorKind::ServerError),
            (400, ErrorKind::Unknown),
            (418, ErrorKind::Unknown),
        ];

        for (status, kind) in cases {
            let err = ClientError::from_status(
                StatusCode::from_u16(status).unwrap(),
                "payload".to_string(),
            );
            assert_eq!(err.kind(), kind, "status {}", status);
            assert_eq!(err.body(), Some("payload"));
        }
    }

    #[test]
    fn test_session_affecting_errors() {
        assert!(ClientError::StateMismatch.affects_session());
        assert!(ClientError::ExchangeFailed("boom".into()).affects_session());
        assert!(ClientError::Unauthorized { body: String::new() }.affects_session());
        assert!(!ClientError::Forbidden { body: String::new() }.affects_session());
        assert!(!ClientError::StreamTerminated("eof".into()).affects_session());
    }
}
