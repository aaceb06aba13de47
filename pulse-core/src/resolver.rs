//! Single-flight actor resolution cache
//!
//! Resolves the actor behind the current auth token at most once per token
//! generation. Concurrent callers share one in-flight resolution; a token
//! change busts the cache and discards any in-flight result for the old
//! token. Failures resolve to the fallback actor and are cached like
//! successes, so a broken identity endpoint is hit once per token, not once
//! per caller.

use crate::actor::{ActorInfo, AuthContext};
use crate::error::GatewayError;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::sync::Arc;

/// Synchronous read of the current bearer token. Consumed, never mutated,
/// by this crate.
pub trait TokenSource: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// In-memory token cell, cloneable across the stream transport, the
/// resolver, and tests.
#[derive(Clone, Default)]
pub struct SharedTokenSource {
    token: Arc<Mutex<Option<String>>>,
}

impl SharedTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let source = Self::new();
        source.set(token);
        source
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.lock() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.lock() = None;
    }
}

impl TokenSource for SharedTokenSource {
    fn current_token(&self) -> Option<String> {
        self.token.lock().clone()
    }
}

/// Resolves a bearer token to an auth context at the identity endpoint.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthContext, GatewayError>;
}

type PendingResolution = Shared<BoxFuture<'static, ActorInfo>>;

enum ResolutionState {
    Unresolved,
    Resolving(PendingResolution),
    Resolved(ActorInfo),
}

struct Slot {
    /// Bumped on every token change; a resolution result is only committed
    /// if the generation it started under is still current.
    generation: u64,
    token: Option<String>,
    state: ResolutionState,
}

/// Caches the resolved actor identity for the current auth token.
///
/// `resolve()` never fails: any resolution problem yields
/// [`ActorInfo::fallback`].
pub struct ActorResolutionCache {
    tokens: Arc<dyn TokenSource>,
    identity: Arc<dyn IdentityGateway>,
    slot: Mutex<Slot>,
}

impl ActorResolutionCache {
    pub fn new(tokens: Arc<dyn TokenSource>, identity: Arc<dyn IdentityGateway>) -> Self {
        Self {
            tokens,
            identity,
            slot: Mutex::new(Slot {
                generation: 0,
                token: None,
                state: ResolutionState::Unresolved,
            }),
        }
    }

    /// Resolve the actor for the current token.
    ///
    /// At most one gateway call is outstanding per token generation;
    /// concurrent callers await the same in-flight resolution.
    pub async fn resolve(&self) -> ActorInfo {
        let current = self.tokens.current_token();
        let (pending, generation) = {
            let mut slot = self.slot.lock();
            if slot.token != current {
                slot.generation = slot.generation.wrapping_add(1);
                slot.token = current.clone();
                slot.state = ResolutionState::Unresolved;
            }

            if let ResolutionState::Resolved(actor) = &slot.state {
                return actor.clone();
            }
            if let ResolutionState::Resolving(pending) = &slot.state {
                (pending.clone(), slot.generation)
            } else {
                let Some(token) = current else {
                    let fallback = ActorInfo::fallback();
                    slot.state = ResolutionState::Resolved(fallback.clone());
                    return fallback;
                };
                let identity = Arc::clone(&self.identity);
                let pending = async move {
                    match identity.resolve(&token).await {
                        Ok(context) => ActorInfo::from_auth_context(Some(&context)),
                        Err(error) => {
                            tracing::warn!(%error, "actor resolution failed, using fallback");
                            ActorInfo::fallback()
                        }
                    }
                }
                .boxed()
                .shared();
                slot.state = ResolutionState::Resolving(pending.clone());
                (pending, slot.generation)
            }
        };

        let actor = pending.await;

        let mut slot = self.slot.lock();
        if slot.generation == generation {
            slot.state = ResolutionState::Resolved(actor.clone());
        }
        // A stale generation means the token moved on mid-flight; the result
        // still goes back to this caller but is never cached.
        actor
    }
}
