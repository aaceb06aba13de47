//! pulse-client - HTTP edge for the pulse synchronization core
//!
//! Implements the `pulse-core` transport and gateway traits over HTTP:
//! - [`SseTransport`]: the server push stream, decoded with `sse-stream`
//! - [`HttpGateway`]: identity resolution (GET) and telemetry writes (POST)
//!
//! Everything here is glue; the state machines and caching live in
//! `pulse-core`.

mod error;
mod gateway;
mod sse;

pub use error::ClientError;
pub use gateway::{HttpGateway, HttpGatewayBuilder};
pub use sse::SseTransport;
