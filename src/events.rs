//! Component G — Event Emitter.
//!
//! Best-effort side channel publishing human-readable status events on the
//! Secret object a reconciliation step actually concerns. Built on
//! `kube::runtime::events` (part of the same `runtime` feature the teacher
//! already enables on `kube`), so no new dependency is introduced for this
//! component.
//!
//! A [`Recorder`] is not bound to a single object — it only carries the
//! client and the [`Reporter`] identity — and each [`emit`] call supplies the
//! `ObjectReference` the event is attached to, grounded on
//! `molnett-neon-operator`'s and `pando85-kaniop`'s `Recorder::new(client,
//! reporter)` / `recorder.publish(&event, &object_ref)` usage. This matters
//! because a single Fan-out Planner pass touches one Secret per target
//! namespace: binding the Recorder to the Origin once, as the teacher's scale
//! never needed to, would attach every per-target event to the Origin instead
//! of the namespace it actually describes.
//!
//! Mirrors the original Python source's `create_event`, which wraps the
//! Kubernetes API call in a try/except and only logs on failure — emission
//! failures here are likewise never allowed to affect the reconciliation
//! outcome (§4.G).

use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;

/// Component name reported on every Event this controller publishes.
pub const COMPONENT: &str = "kss-operator";

/// The fixed set of reasons this controller ever publishes, per §4.G.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventReason {
    SyncTriggered,
    SecretSynced,
    SyncSkipped,
    SyncFailed,
    SyncedSecretDeleted,
    SecretReconciled,
}

impl EventReason {
    fn as_str(self) -> &'static str {
        match self {
            EventReason::SyncTriggered => "SyncTriggered",
            EventReason::SecretSynced => "SecretSynced",
            EventReason::SyncSkipped => "SyncSkipped",
            EventReason::SyncFailed => "SyncFailed",
            EventReason::SyncedSecretDeleted => "SyncedSecretDeleted",
            EventReason::SecretReconciled => "SecretReconciled",
        }
    }

    /// `SyncSkipped` and `SyncFailed` are Warning severity per §4.G; everything
    /// else is informational.
    fn event_type(self) -> EventType {
        match self {
            EventReason::SyncSkipped | EventReason::SyncFailed => EventType::Warning,
            _ => EventType::Normal,
        }
    }
}

/// Builds the `Reporter` identifying this controller as the event source.
pub fn reporter() -> Reporter {
    Reporter::from(COMPONENT.to_string())
}

/// Builds a [`Recorder`] for `client`. Unlike the teacher's scale, this
/// controller must attach events to many distinct Secrets (one per target
/// namespace) over the lifetime of a single Recorder, so the object
/// reference is supplied per [`emit`] call instead of at construction.
pub fn recorder(client: Client) -> Recorder {
    Recorder::new(client, reporter())
}

/// Builds the `ObjectReference` for a Secret named `name` in `namespace`,
/// valid even when that Secret does not exist yet — the same synthetic
/// reference the Python source builds with
/// `V1ObjectReference(kind="Secret", name=name, namespace=ns_name)`.
pub fn secret_ref(name: &str, namespace: &str) -> ObjectReference {
    ObjectReference {
        api_version: Some("v1".to_string()),
        kind: Some("Secret".to_string()),
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Publishes an event against `object_ref`, logging and swallowing any
/// failure to publish it.
pub async fn emit(
    recorder: &Recorder,
    reason: EventReason,
    message: impl Into<String>,
    object_ref: &ObjectReference,
) {
    let ev = Event {
        type_: reason.event_type(),
        reason: reason.as_str().into(),
        note: Some(message.into()),
        action: reason.as_str().into(),
        secondary: None,
    };

    if let Err(err) = recorder.publish(&ev, object_ref).await {
        tracing::warn!(error = %err, reason = reason.as_str(), "failed to publish event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_matches_spec() {
        assert_eq!(EventReason::SyncSkipped.event_type(), EventType::Warning);
        assert_eq!(EventReason::SyncFailed.event_type(), EventType::Warning);
        assert_eq!(EventReason::SecretSynced.event_type(), EventType::Normal);
        assert_eq!(EventReason::SyncTriggered.event_type(), EventType::Normal);
        assert_eq!(EventReason::SyncedSecretDeleted.event_type(), EventType::Normal);
        assert_eq!(EventReason::SecretReconciled.event_type(), EventType::Normal);
    }

    #[test]
    fn reason_strings_match_spec_names() {
        assert_eq!(EventReason::SyncTriggered.as_str(), "SyncTriggered");
        assert_eq!(EventReason::SecretSynced.as_str(), "SecretSynced");
        assert_eq!(EventReason::SyncSkipped.as_str(), "SyncSkipped");
        assert_eq!(EventReason::SyncFailed.as_str(), "SyncFailed");
        assert_eq!(
            EventReason::SyncedSecretDeleted.as_str(),
            "SyncedSecretDeleted"
        );
        assert_eq!(EventReason::SecretReconciled.as_str(), "SecretReconciled");
    }

    #[test]
    fn secret_ref_names_the_target_not_the_origin() {
        let r = secret_ref("s1", "ns-b");
        assert_eq!(r.name.as_deref(), Some("s1"));
        assert_eq!(r.namespace.as_deref(), Some("ns-b"));
        assert_eq!(r.kind.as_deref(), Some("Secret"));
    }
}
