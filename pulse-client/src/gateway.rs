//! Identity and telemetry REST clients

use async_trait::async_trait;
use pulse_core::{
    ActivityGateway, ActivityWrite, AuthContext, GatewayError, IdentityGateway, TokenSource,
};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of the identity-resolution and telemetry-write
/// gateways, sharing one connection pool.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

/// Builder for [`HttpGateway`].
pub struct HttpGatewayBuilder {
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpGatewayBuilder {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpGateway, crate::ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()?;
        Ok(HttpGateway {
            http,
            base_url: trim_trailing_slash(self.base_url),
            tokens: self.tokens,
        })
    }
}

impl HttpGateway {
    /// Create a gateway with default HTTP settings.
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, crate::ClientError> {
        HttpGatewayBuilder::new(base_url, tokens).build()
    }

    pub fn builder(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> HttpGatewayBuilder {
        HttpGatewayBuilder::new(base_url, tokens)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[async_trait]
impl IdentityGateway for HttpGateway {
    async fn resolve(&self, token: &str) -> Result<AuthContext, GatewayError> {
        let response = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| GatewayError::Network {
                reason: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_http_status(status.as_u16(), message));
        }

        response
            .json::<AuthContext>()
            .await
            .map_err(|error| GatewayError::Decode {
                reason: error.to_string(),
            })
    }
}

#[async_trait]
impl ActivityGateway for HttpGateway {
    async fn record(&self, write: &ActivityWrite) -> Result<(), GatewayError> {
        let mut request = self
            .http
            .post(format!("{}/activities", self.base_url))
            .json(write);
        if let Some(token) = self.tokens.current_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| GatewayError::Network {
            reason: error.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_http_status(status.as_u16(), message));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(trim_trailing_slash("http://x/".to_string()), "http://x");
        assert_eq!(trim_trailing_slash("http://x".to_string()), "http://x");
    }
}
