//! Transport error types.

use thiserror::Error;

/// Host-side status of a remote call, mirroring the platform's
/// numeric status codes one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Success,
    Redirected,
    BadRequest,
    AccessDenied,
    NotFound,
    Timeout,
    RequestTooLarge,
    ServerError,
    RequestCancelled,
    InternalError,
    /// A code outside the documented table.
    Unknown(u16),
}

impl RemoteStatus {
    /// Maps the platform's numeric code to a status.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Success,
            2 => Self::Redirected,
            3 => Self::BadRequest,
            4 => Self::AccessDenied,
            5 => Self::NotFound,
            6 => Self::Timeout,
            7 => Self::RequestTooLarge,
            8 => Self::ServerError,
            9 => Self::RequestCancelled,
            10 => Self::InternalError,
            other => Self::Unknown(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Redirected => write!(f, "redirected"),
            Self::BadRequest => write!(f, "bad request"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::NotFound => write!(f, "not found"),
            Self::Timeout => write!(f, "timeout"),
            Self::RequestTooLarge => write!(f, "request too large"),
            Self::ServerError => write!(f, "server error"),
            Self::RequestCancelled => write!(f, "request cancelled"),
            Self::InternalError => write!(f, "internal error"),
            Self::Unknown(code) => write!(f, "unknown status code {code}"),
        }
    }
}

/// Errors surfaced by a [`TurnGateway`](crate::TurnGateway).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serialized request body exceeds the payload size limit.
    /// Raised locally, before any network call.
    #[error("request body exceeds the payload size limit")]
    PayloadTooLarge,

    /// The host reported a non-success status for a remote call.
    #[error("remote call failed: {status}: {body}")]
    Remote { status: RemoteStatus, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_table() {
        assert_eq!(RemoteStatus::from_code(1), RemoteStatus::Success);
        assert_eq!(RemoteStatus::from_code(4), RemoteStatus::AccessDenied);
        assert_eq!(RemoteStatus::from_code(7), RemoteStatus::RequestTooLarge);
        assert_eq!(RemoteStatus::from_code(10), RemoteStatus::InternalError);
        assert_eq!(RemoteStatus::from_code(42), RemoteStatus::Unknown(42));
    }

    #[test]
    fn test_only_one_is_success() {
        assert!(RemoteStatus::Success.is_success());
        assert!(!RemoteStatus::Redirected.is_success());
        assert!(!RemoteStatus::Unknown(1).is_success());
    }

    #[test]
    fn test_remote_error_display_includes_status_and_body() {
        let err = TransportError::Remote {
            status: RemoteStatus::Timeout,
            body: "deadline exceeded".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("timeout"));
        assert!(rendered.contains("deadline exceeded"));
    }
}
