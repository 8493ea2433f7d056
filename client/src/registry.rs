//! Token registry — correlates outstanding requests with their responses.
//!
//! One service object shared by the sender and the response router; no
//! module-level state. Every mutation holds the lock for the full
//! read-modify-write.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;

/// The logical identity a request was issued on behalf of.
///
/// The embedding editor layer passes this explicitly into every call;
/// the client never queries global editor state to discover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewContext {
    pub window: u32,
    pub view: u32,
}

impl ViewContext {
    #[must_use]
    pub fn new(window: u32, view: u32) -> Self {
        Self { window, view }
    }
}

/// The kinds of requests whose tokens the registry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RequestKind {
    SetRoots,
    UpdateContent,
    Search,
    Version,
}

/// State kept for one outstanding request.
pub(crate) struct PendingRequest {
    pub context: ViewContext,
    pub kind: RequestKind,
    /// Completed with the response payload, or `None` for fire-and-forget
    /// requests whose response is consumed silently.
    pub reply: Option<oneshot::Sender<Value>>,
}

#[derive(Default)]
struct Inner {
    seq: u64,
    /// Current valid token per (context, kind). Issuing a new token for a
    /// pair supersedes the old one.
    live: HashMap<(ViewContext, RequestKind), String>,
    /// Token → outstanding request.
    pending: HashMap<String, PendingRequest>,
}

/// Process-wide mapping from (context, kind) to the current valid token
/// and from token to its outstanding request.
#[derive(Default)]
pub(crate) struct TokenRegistry {
    inner: Mutex<Inner>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a fresh token for `(context, kind)` and record it as the
    /// current valid one, superseding (and invalidating) any previous
    /// token for the pair.
    ///
    /// Tokens are `"{window}:{view}:{seq}"` with a process-monotonic
    /// sequence, unique within a session.
    pub fn issue(
        &self,
        context: ViewContext,
        kind: RequestKind,
        reply: Option<oneshot::Sender<Value>>,
    ) -> String {
        let mut inner = self.lock();
        inner.seq += 1;
        let token = format!("{}:{}:{}", context.window, context.view, inner.seq);

        if let Some(old) = inner.live.insert((context, kind), token.clone()) {
            inner.pending.remove(&old);
        }
        inner.pending.insert(
            token.clone(),
            PendingRequest {
                context,
                kind,
                reply,
            },
        );
        token
    }

    /// Remove and return the outstanding request for `token`.
    ///
    /// At-most-once: a second call with the same token returns `None`.
    pub fn resolve(&self, token: &str) -> Option<PendingRequest> {
        let mut inner = self.lock();
        let pending = inner.pending.remove(token)?;
        let key = (pending.context, pending.kind);
        if inner.live.get(&key).is_some_and(|t| t == token) {
            inner.live.remove(&key);
        }
        Some(pending)
    }

    /// Kind of the request `token` belongs to, without resolving it.
    pub fn kind_of(&self, token: &str) -> Option<RequestKind> {
        self.lock().pending.get(token).map(|p| p.kind)
    }

    /// Server-initiated token swap: the owning (context, kind) slot is
    /// rekeyed to `new` and `old` is invalid from this point on.
    ///
    /// Returns `false` if `old` was not tracked (already resolved,
    /// superseded, or never ours).
    pub fn reassign(&self, old: &str, new: String) -> bool {
        let mut inner = self.lock();
        let Some(pending) = inner.pending.remove(old) else {
            return false;
        };
        inner
            .live
            .insert((pending.context, pending.kind), new.clone());
        inner.pending.insert(new, pending);
        true
    }

    /// Drop every outstanding request for a closed document/window.
    pub fn prune(&self, context: ViewContext) {
        let mut inner = self.lock();
        let Inner { live, pending, .. } = &mut *inner;
        live.retain(|&(ctx, _), token| {
            if ctx == context {
                pending.remove(token);
                false
            } else {
                true
            }
        });
        // Tokens already superseded out of `live` but still pending.
        pending.retain(|_, p| p.context != context);
    }

    #[cfg(test)]
    pub fn outstanding(&self) -> usize {
        self.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: ViewContext = ViewContext { window: 1, view: 7 };

    #[test]
    fn test_tokens_embed_context_and_are_unique() {
        let registry = TokenRegistry::new();
        let a = registry.issue(CTX, RequestKind::SetRoots, None);
        let b = registry.issue(CTX, RequestKind::UpdateContent, None);
        assert!(a.starts_with("1:7:"));
        assert!(b.starts_with("1:7:"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_is_at_most_once() {
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Version, None);

        let pending = registry.resolve(&token).unwrap();
        assert_eq!(pending.context, CTX);
        assert_eq!(pending.kind, RequestKind::Version);

        assert!(registry.resolve(&token).is_none());
    }

    #[test]
    fn test_issuing_supersedes_previous_token_for_same_pair() {
        let registry = TokenRegistry::new();
        let old = registry.issue(CTX, RequestKind::Search, None);
        let new = registry.issue(CTX, RequestKind::Search, None);

        assert!(registry.resolve(&old).is_none(), "old token must be dead");
        assert!(registry.resolve(&new).is_some());
    }

    #[test]
    fn test_supersession_is_per_context() {
        let registry = TokenRegistry::new();
        let other = ViewContext::new(2, 9);
        let a = registry.issue(CTX, RequestKind::Search, None);
        let b = registry.issue(other, RequestKind::Search, None);

        assert!(registry.resolve(&a).is_some());
        assert!(registry.resolve(&b).is_some());
    }

    #[test]
    fn test_reassign_moves_ownership_to_new_token() {
        let registry = TokenRegistry::new();
        let old = registry.issue(CTX, RequestKind::Search, None);

        assert!(registry.reassign(&old, "9:9:99".to_string()));
        assert!(registry.resolve(&old).is_none());

        let pending = registry.resolve("9:9:99").unwrap();
        assert_eq!(pending.context, CTX);
        assert_eq!(pending.kind, RequestKind::Search);
    }

    #[test]
    fn test_reassign_of_unknown_token_is_rejected() {
        let registry = TokenRegistry::new();
        assert!(!registry.reassign("1:1:1", "2:2:2".to_string()));
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_prune_drops_only_that_context() {
        let registry = TokenRegistry::new();
        let other = ViewContext::new(3, 4);
        registry.issue(CTX, RequestKind::Search, None);
        registry.issue(CTX, RequestKind::UpdateContent, None);
        let kept = registry.issue(other, RequestKind::Search, None);

        registry.prune(CTX);

        assert_eq!(registry.outstanding(), 1);
        assert!(registry.resolve(&kept).is_some());
    }

    #[test]
    fn test_kind_of_does_not_consume() {
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Search, None);
        assert_eq!(registry.kind_of(&token), Some(RequestKind::Search));
        assert!(registry.resolve(&token).is_some());
    }
}
