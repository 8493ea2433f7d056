//! Response classifier — decides what each decoded server message is.
//!
//! Decision order, first match wins: shutdown sentinel, reply to a
//! tracked token (including the token-reassignment notice a search
//! response carries), known notification event, anything else is
//! unrecognized. Decoding failures for a known event are reported
//! distinctly so the dispatch loop can log them without dying.

use serde_json::Value;

use crate::protocol::{
    AnalysisErrorsParams, AnalysisNavigationParams, CompletionResultsParams, NotificationKind,
    SearchResultsParams, ServerStatusParams,
};
use crate::registry::{PendingRequest, RequestKind, TokenRegistry};

/// One item on the decoded-response queue.
#[derive(Debug)]
pub(crate) enum RouterCommand {
    Message(Value),
    /// Coordinated-shutdown sentinel; terminates the router loop.
    Shutdown,
}

/// A fully decoded notification payload.
#[derive(Debug)]
pub(crate) enum Notification {
    Errors(AnalysisErrorsParams),
    Navigation(AnalysisNavigationParams),
    Completions(CompletionResultsParams),
    SearchResults(SearchResultsParams),
    Status(ServerStatusParams),
}

/// Outcome of classifying one inbound message.
pub(crate) enum Classified {
    Shutdown,
    /// Reply to an outstanding request; the token has been removed from
    /// the registry.
    Result {
        pending: PendingRequest,
        payload: Value,
    },
    /// Server-initiated token swap for a search request. The registry has
    /// already been updated; nothing is delivered to any consumer.
    Reassigned { old: String, new: String },
    Notification(Notification),
    /// A known event whose payload did not decode.
    DecodeError {
        kind: NotificationKind,
        source: serde_json::Error,
    },
    /// No tracked token and no known event: stale, duplicate, or foreign.
    Unrecognized,
}

pub(crate) fn classify(cmd: RouterCommand, registry: &TokenRegistry) -> Classified {
    let msg = match cmd {
        RouterCommand::Shutdown => return Classified::Shutdown,
        RouterCommand::Message(msg) => msg,
    };

    if let Some(id) = msg.get("id").and_then(Value::as_str) {
        // A search response carries the server-assigned replacement token
        // in its result; the reply proper arrives later as search.results.
        if registry.kind_of(id) == Some(RequestKind::Search)
            && let Some(new) = msg.pointer("/result/id").and_then(Value::as_str)
        {
            if registry.reassign(id, new.to_string()) {
                return Classified::Reassigned {
                    old: id.to_string(),
                    new: new.to_string(),
                };
            }
            return Classified::Unrecognized;
        }

        if let Some(pending) = registry.resolve(id) {
            let payload = msg.get("result").cloned().unwrap_or(Value::Null);
            return Classified::Result { pending, payload };
        }
        // Untracked id: fall through, the message may still be a known
        // event (the result-match rule only wins for tracked tokens).
    }

    let Some(kind) = msg
        .get("event")
        .and_then(Value::as_str)
        .and_then(NotificationKind::from_event)
    else {
        return Classified::Unrecognized;
    };

    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    let decoded = match kind {
        NotificationKind::Errors => {
            serde_json::from_value(params).map(Notification::Errors)
        }
        NotificationKind::Navigation => {
            serde_json::from_value(params).map(Notification::Navigation)
        }
        NotificationKind::Completions => {
            serde_json::from_value(params).map(Notification::Completions)
        }
        NotificationKind::SearchResults => {
            serde_json::from_value(params).map(Notification::SearchResults)
        }
        NotificationKind::Status => serde_json::from_value(params).map(Notification::Status),
    };

    match decoded {
        Ok(notification) => Classified::Notification(notification),
        Err(source) => Classified::DecodeError { kind, source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ViewContext;

    const CTX: ViewContext = ViewContext { window: 1, view: 2 };

    fn msg(value: Value) -> RouterCommand {
        RouterCommand::Message(value)
    }

    #[test]
    fn test_shutdown_sentinel_wins() {
        let registry = TokenRegistry::new();
        assert!(matches!(
            classify(RouterCommand::Shutdown, &registry),
            Classified::Shutdown
        ));
    }

    #[test]
    fn test_tracked_token_resolves_to_result() {
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Version, None);

        let classified = classify(
            msg(serde_json::json!({"id": token, "result": {"version": "1.7.0"}})),
            &registry,
        );

        match classified {
            Classified::Result { pending, payload } => {
                assert_eq!(pending.context, CTX);
                assert_eq!(payload["version"], "1.7.0");
            }
            _ => panic!("expected Result"),
        }
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_duplicate_response_is_unrecognized() {
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Version, None);

        let first = classify(msg(serde_json::json!({"id": token, "result": {}})), &registry);
        assert!(matches!(first, Classified::Result { .. }));

        let second = classify(msg(serde_json::json!({"id": token, "result": {}})), &registry);
        assert!(matches!(second, Classified::Unrecognized));
    }

    #[test]
    fn test_search_response_with_new_id_is_reassignment() {
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Search, None);

        let classified = classify(
            msg(serde_json::json!({"id": token, "result": {"id": "srv-42"}})),
            &registry,
        );

        match classified {
            Classified::Reassigned { old, new } => {
                assert_eq!(old, token);
                assert_eq!(new, "srv-42");
            }
            _ => panic!("expected Reassigned"),
        }

        // The old token is no longer honored; the new one resolves.
        assert!(matches!(
            classify(msg(serde_json::json!({"id": token, "result": {}})), &registry),
            Classified::Unrecognized
        ));
        assert!(matches!(
            classify(
                msg(serde_json::json!({"id": "srv-42", "result": {}})),
                &registry
            ),
            Classified::Result { .. }
        ));
    }

    #[test]
    fn test_result_match_takes_precedence_over_event_name() {
        // Contrived: a message carrying both a tracked id and a known
        // event name must classify as a result, not a notification.
        let registry = TokenRegistry::new();
        let token = registry.issue(CTX, RequestKind::Version, None);

        let classified = classify(
            msg(serde_json::json!({
                "id": token,
                "event": "server.status",
                "result": {},
                "params": {"status": {"message": "x"}}
            })),
            &registry,
        );
        assert!(matches!(classified, Classified::Result { .. }));
    }

    #[test]
    fn test_untracked_id_with_known_event_is_notification() {
        let registry = TokenRegistry::new();
        let classified = classify(
            msg(serde_json::json!({
                "id": "0:0:0",
                "event": "server.status",
                "params": {"status": {"message": "analyzing"}}
            })),
            &registry,
        );
        assert!(matches!(
            classified,
            Classified::Notification(Notification::Status(_))
        ));
    }

    #[test]
    fn test_known_events_decode() {
        let registry = TokenRegistry::new();

        let classified = classify(
            msg(serde_json::json!({
                "event": "analysis.errors",
                "params": {"file": "/p/a.dart", "errors": []}
            })),
            &registry,
        );
        assert!(matches!(
            classified,
            Classified::Notification(Notification::Errors(_))
        ));

        let classified = classify(
            msg(serde_json::json!({
                "event": "completion.results",
                "params": {
                    "id": "1:1:1",
                    "replacementOffset": 0,
                    "replacementLength": 0,
                    "results": [],
                    "isLast": true
                }
            })),
            &registry,
        );
        assert!(matches!(
            classified,
            Classified::Notification(Notification::Completions(_))
        ));
    }

    #[test]
    fn test_malformed_payload_for_known_event_is_decode_error() {
        let registry = TokenRegistry::new();
        let classified = classify(
            msg(serde_json::json!({
                "event": "analysis.errors",
                "params": {"unexpected": true}
            })),
            &registry,
        );
        match classified {
            Classified::DecodeError { kind, .. } => {
                assert_eq!(kind, NotificationKind::Errors);
            }
            _ => panic!("expected DecodeError"),
        }
    }

    #[test]
    fn test_unknown_event_is_unrecognized() {
        let registry = TokenRegistry::new();
        let classified = classify(
            msg(serde_json::json!({"event": "server.connected", "params": {}})),
            &registry,
        );
        assert!(matches!(classified, Classified::Unrecognized));
    }
}
