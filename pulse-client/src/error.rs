//! Client construction errors

/// Errors building HTTP clients. Runtime failures are reported through the
/// `pulse-core` error types at the trait boundaries instead.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
