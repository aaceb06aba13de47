//! Gateway errors
//!
//! Shared by the identity-resolution and telemetry-write seams. Nothing in
//! this crate propagates these to external callers; they exist so the
//! resolver and reporter can classify and log what they swallow.

/// Errors from the identity and telemetry gateways.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("http error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("network error: {reason}")]
    Network { reason: String },

    #[error("decode error: {reason}")]
    Decode { reason: String },
}

impl GatewayError {
    /// Create from HTTP status code and response body.
    pub fn from_http_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            _ => Self::Http { status, message },
        }
    }
}
