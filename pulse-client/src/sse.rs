//! SSE implementation of the push-stream transport
//!
//! One `open()` issues one GET against the stream endpoint and keeps the
//! response body open, decoding SSE frames as they arrive. Frames without an
//! event name (keep-alives, comments) are skipped; everything named is
//! forwarded untouched, `init` included. Interpreting names is the
//! supervisor's job.

use futures::StreamExt;
use pulse_core::{EventStream, EventTransport, StreamEvent, TokenSource, TransportError};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sse_stream::SseStream;
use std::sync::Arc;
use std::time::Duration;

const EVENT_STREAM_MIME_TYPE: &str = "text/event-stream";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `EventTransport` over Server-Sent Events.
pub struct SseTransport {
    client: reqwest::Client,
    stream_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl SseTransport {
    /// Connect to `stream_url` with a default HTTP client. The bearer token
    /// is re-read from `tokens` on every attempt, so reconnects pick up
    /// token changes.
    pub fn new(
        stream_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, crate::ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, stream_url, tokens))
    }

    /// Use a preconfigured HTTP client. No request timeout should be set on
    /// it: the stream response deliberately never completes.
    pub fn with_client(
        client: reqwest::Client,
        stream_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            stream_url: stream_url.into(),
            tokens,
        }
    }
}

#[async_trait::async_trait]
impl EventTransport for SseTransport {
    async fn open(&self) -> Result<EventStream, TransportError> {
        let mut request = self
            .client
            .get(&self.stream_url)
            .header(ACCEPT, EVENT_STREAM_MIME_TYPE);
        if let Some(token) = self.tokens.current_token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| TransportError::Connect {
                reason: error.to_string(),
            })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with(EVENT_STREAM_MIME_TYPE) {
            return Err(TransportError::Connect {
                reason: format!("unexpected content type: {content_type:?}"),
            });
        }

        tracing::debug!(url = %self.stream_url, "event stream opened");
        let frames = SseStream::from_byte_stream(response.bytes_stream());
        let events = frames
            .filter_map(|frame| async move {
                match frame {
                    Ok(sse) => sse.event.map(|name| {
                        Ok(StreamEvent {
                            name,
                            data: sse.data,
                        })
                    }),
                    Err(error) => Some(Err(TransportError::Stream {
                        reason: error.to_string(),
                    })),
                }
            })
            .boxed();
        Ok(events)
    }
}
