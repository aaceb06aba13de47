//! pulse-core - Live-state synchronization core
//!
//! This crate contains the client-side machinery that keeps a local read
//! cache fresh under server-push invalidation: a supervised event-stream
//! connection with capped exponential reconnect, a data-driven router from
//! event names to cache key-groups, a single-flight actor resolution cache
//! keyed by the current auth token, and a best-effort activity reporter.
//!
//! It is intentionally free of I/O dependencies: the push stream, the
//! identity endpoint, the telemetry endpoint, and the read cache are all
//! consumed through traits, so everything here is testable with in-memory
//! fakes. The HTTP implementations live in `pulse-client`.

pub mod actor;
pub mod config;
pub mod connection;
pub mod error;
pub mod invalidation;
pub mod reporter;
pub mod resolver;
pub mod retry;
pub mod transport;

// Re-export main types at crate root
pub use actor::{ActorInfo, ActorKind, AuthContext};
pub use config::SyncConfig;
pub use connection::{ConnectionState, EventStreamConnection};
pub use error::GatewayError;
pub use invalidation::{
    BASELINE_GROUPS, CacheInvalidator, InvalidationRouter, KeyGroup, groups_for_event,
};
pub use reporter::{ActivityGateway, ActivityRecord, ActivityReporter, ActivityWrite};
pub use resolver::{ActorResolutionCache, IdentityGateway, SharedTokenSource, TokenSource};
pub use retry::ReconnectPolicy;
pub use transport::{EventStream, EventTransport, INIT_EVENT, StreamEvent, TransportError};
