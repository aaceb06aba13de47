//! Event-name to cache key-group invalidation routing
//!
//! The server announces mutations as named events; each name maps to one or
//! more key-groups of the external read cache. Invalidation is coarse by
//! key-group, never per record: a missed invalidation is the only failure
//! mode that matters, an extra refetch is acceptable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A partition of the external read cache that is invalidated as one unit.
///
/// The wire/path form of each group is its kebab-case name
/// (e.g. `strategy-changes`), available via [`KeyGroup::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyGroup {
    Tasks,
    Agents,
    Activity,
    Knowledge,
    Projects,
    Evaluations,
    StrategyChanges,
    CoordThreads,
    CoordMessages,
}

impl KeyGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Agents => "agents",
            Self::Activity => "activity",
            Self::Knowledge => "knowledge",
            Self::Projects => "projects",
            Self::Evaluations => "evaluations",
            Self::StrategyChanges => "strategy-changes",
            Self::CoordThreads => "coord-threads",
            Self::CoordMessages => "coord-messages",
        }
    }
}

impl std::fmt::Display for KeyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-groups re-invalidated wholesale when the stream (re)connects, to
/// resynchronize anything that drifted while disconnected. These are the
/// primary live entities; the remaining groups change rarely enough that
/// their next mutation event covers them.
pub const BASELINE_GROUPS: &[KeyGroup] = &[
    KeyGroup::Tasks,
    KeyGroup::Agents,
    KeyGroup::Projects,
    KeyGroup::Activity,
];

/// Static mapping from server event name to the key-groups it invalidates.
///
/// Unknown names map to the empty slice: the server may grow new event types
/// before this client learns about them, and that must not be an error.
pub fn groups_for_event(name: &str) -> &'static [KeyGroup] {
    use KeyGroup::*;
    match name {
        "task:created" | "task:updated" | "task:failed" => &[Tasks, Activity],
        "task:assigned" => &[Tasks, Agents, Activity],
        "agent:heartbeat" => &[Agents, Activity],
        "knowledge:created" | "knowledge:updated" | "knowledge:deleted" => &[Knowledge],
        "project:created" | "project:updated" | "project:deleted" => &[Projects],
        "evaluation:created" => &[Evaluations],
        "strategy:updated" => &[StrategyChanges, Projects],
        "activity:logged" => &[Activity],
        "coord:thread:created" => &[CoordThreads],
        "coord:message:created" => &[CoordMessages],
        _ => &[],
    }
}

/// The externally-owned read cache, consumed only through this contract.
///
/// Invalidating a group the cache holds nothing for must be a no-op on the
/// implementor's side; the router does not track what is cached.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, group: KeyGroup);
}

/// Routes named server events to cache invalidations.
#[derive(Clone)]
pub struct InvalidationRouter {
    cache: Arc<dyn CacheInvalidator>,
}

impl InvalidationRouter {
    pub fn new(cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { cache }
    }

    /// Invalidate every group mapped to `event_name`, in table order.
    ///
    /// Unknown event names are a silent no-op.
    pub async fn route(&self, event_name: &str) {
        let groups = groups_for_event(event_name);
        if groups.is_empty() {
            tracing::debug!(event = event_name, "no invalidation mapping for event");
            return;
        }
        tracing::debug!(event = event_name, groups = ?groups, "invalidating for event");
        for group in groups {
            self.cache.invalidate(*group).await;
        }
    }

    /// Bulk-invalidate the baseline groups. Called once per (re)connect.
    pub async fn resync(&self) {
        tracing::debug!("resynchronizing baseline key-groups");
        for group in BASELINE_GROUPS {
            self.cache.invalidate(*group).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingCache {
        invalidated: Mutex<Vec<KeyGroup>>,
    }

    #[async_trait]
    impl CacheInvalidator for RecordingCache {
        async fn invalidate(&self, group: KeyGroup) {
            self.invalidated.lock().push(group);
        }
    }

    fn router() -> (InvalidationRouter, Arc<RecordingCache>) {
        let cache = Arc::new(RecordingCache::default());
        (InvalidationRouter::new(cache.clone() as Arc<dyn CacheInvalidator>), cache)
    }

    #[test]
    fn test_table_is_exact() {
        use KeyGroup::*;
        let expected: &[(&str, &[KeyGroup])] = &[
            ("task:created", &[Tasks, Activity]),
            ("task:updated", &[Tasks, Activity]),
            ("task:assigned", &[Tasks, Agents, Activity]),
            ("task:failed", &[Tasks, Activity]),
            ("agent:heartbeat", &[Agents, Activity]),
            ("knowledge:created", &[Knowledge]),
            ("knowledge:updated", &[Knowledge]),
            ("knowledge:deleted", &[Knowledge]),
            ("project:created", &[Projects]),
            ("project:updated", &[Projects]),
            ("project:deleted", &[Projects]),
            ("evaluation:created", &[Evaluations]),
            ("strategy:updated", &[StrategyChanges, Projects]),
            ("activity:logged", &[Activity]),
            ("coord:thread:created", &[CoordThreads]),
            ("coord:message:created", &[CoordMessages]),
        ];
        for (name, groups) in expected {
            assert_eq!(groups_for_event(name), *groups, "mapping for {name}");
        }
    }

    #[test]
    fn test_unknown_event_maps_to_nothing() {
        assert!(groups_for_event("xyz:unknown").is_empty());
        assert!(groups_for_event("").is_empty());
        // Close-but-wrong names must not match
        assert!(groups_for_event("task:create").is_empty());
        assert!(groups_for_event("tasks:created").is_empty());
    }

    #[tokio::test]
    async fn test_route_invalidates_in_table_order() {
        let (router, cache) = router();
        router.route("task:assigned").await;
        assert_eq!(
            *cache.invalidated.lock(),
            vec![KeyGroup::Tasks, KeyGroup::Agents, KeyGroup::Activity]
        );
    }

    #[tokio::test]
    async fn test_route_unknown_event_is_noop() {
        let (router, cache) = router();
        router.route("xyz:unknown").await;
        assert!(cache.invalidated.lock().is_empty());
    }

    #[tokio::test]
    async fn test_resync_hits_baseline_groups() {
        let (router, cache) = router();
        router.resync().await;
        assert_eq!(*cache.invalidated.lock(), BASELINE_GROUPS.to_vec());
    }

    #[test]
    fn test_key_group_wire_form() {
        assert_eq!(KeyGroup::StrategyChanges.as_str(), "strategy-changes");
        assert_eq!(KeyGroup::CoordMessages.as_str(), "coord-messages");
        let json = serde_json::to_string(&KeyGroup::CoordThreads).unwrap();
        assert_eq!(json, "\"coord-threads\"");
        let parsed: KeyGroup = serde_json::from_str("\"strategy-changes\"").unwrap();
        assert_eq!(parsed, KeyGroup::StrategyChanges);
    }
}
