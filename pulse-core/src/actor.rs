//! Actor identity model
//!
//! Telemetry writes are tagged with the actor behind the current auth token.
//! The identity endpoint returns an opaque auth context; the mapping into an
//! [`ActorInfo`] is deterministic and total: anything unrecognized maps to
//! the fallback actor rather than an error.

use serde::{Deserialize, Serialize};

/// Kind of actor a session can act as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Agent,
    Employee,
    Ceo,
}

/// Resolved actor identity used to attribute telemetry writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub kind: ActorKind,
    pub id: String,
    pub display_name: String,
}

/// Auth context payload from the identity endpoint. All fields are optional
/// on the wire; the mapping below absorbs whatever is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    #[serde(default)]
    pub owner_type: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl ActorInfo {
    /// The identity used whenever resolution is impossible or fails.
    pub fn fallback() -> Self {
        Self {
            kind: ActorKind::Ceo,
            id: "ceo".to_string(),
            display_name: "CEO".to_string(),
        }
    }

    /// Map an auth context to an actor identity.
    pub fn from_auth_context(context: Option<&AuthContext>) -> Self {
        let Some(context) = context else {
            return Self::fallback();
        };
        match context.owner_type.as_deref() {
            Some("agent") => {
                let id = context
                    .owner_id
                    .clone()
                    .unwrap_or_else(|| "unknown-agent".to_string());
                let display_name = context
                    .name
                    .clone()
                    .or_else(|| context.owner_id.clone())
                    .unwrap_or_else(|| "Agent".to_string());
                Self {
                    kind: ActorKind::Agent,
                    id,
                    display_name,
                }
            }
            Some("user") => {
                // A user context without an id is unattributable
                let Some(id) = context.owner_id.clone() else {
                    return Self::fallback();
                };
                let display_name = context.name.clone().unwrap_or_else(|| id.clone());
                let kind = if context.role.as_deref() == Some("ceo") {
                    ActorKind::Ceo
                } else {
                    ActorKind::Employee
                };
                Self {
                    kind,
                    id,
                    display_name,
                }
            }
            _ => Self::fallback(),
        }
    }
}
