//! Best-effort activity reporting
//!
//! Tags telemetry records with the resolved actor and posts them. Telemetry
//! must never become a visible failure in a user-facing flow, so errors on
//! this path are logged and dropped, never propagated.

use crate::error::GatewayError;
use crate::resolver::ActorResolutionCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A telemetry record as supplied by callers, before actor attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub event_type: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The payload posted to the telemetry endpoint: the caller's record merged
/// with the resolved actor's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityWrite {
    pub actor_type: crate::actor::ActorKind,
    pub actor_id: String,
    pub actor_name: String,
    #[serde(flatten)]
    pub record: ActivityRecord,
}

/// Posts activity writes to the telemetry endpoint.
#[async_trait]
pub trait ActivityGateway: Send + Sync {
    async fn record(&self, write: &ActivityWrite) -> Result<(), GatewayError>;
}

/// Best-effort telemetry writer.
pub struct ActivityReporter {
    resolver: Arc<ActorResolutionCache>,
    gateway: Arc<dyn ActivityGateway>,
    dropped: AtomicU64,
}

impl ActivityReporter {
    pub fn new(resolver: Arc<ActorResolutionCache>, gateway: Arc<dyn ActivityGateway>) -> Self {
        Self {
            resolver,
            gateway,
            dropped: AtomicU64::new(0),
        }
    }

    /// Resolve the actor, merge it into the record, and post. Fire-and-forget
    /// from the caller's perspective: this never returns or propagates an
    /// error.
    pub async fn report(&self, record: ActivityRecord) {
        let actor = self.resolver.resolve().await;
        let write = ActivityWrite {
            actor_type: actor.kind,
            actor_id: actor.id,
            actor_name: actor.display_name,
            record,
        };
        if let Err(error) = self.gateway.record(&write).await {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(%error, event_type = %write.record.event_type, "dropped activity write");
        }
    }

    /// Number of writes dropped since construction. Surfaced for operational
    /// visibility; dropped writes are never retried.
    pub fn dropped_writes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
