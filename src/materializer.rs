//! Component B — Replica Materializer.
//!
//! Builds the desired Replica from an Origin and performs an idempotent
//! create-or-update against a single target namespace. Grounded on the
//! teacher's `sync_secret` inner loop (`secret_api.get` / `create` / `patch`),
//! generalized to operate on one target namespace at a time so the Fan-out
//! Planner (§4.C) and the Periodic Reconciler (§4.E) can share it.

use std::time::{SystemTime, UNIX_EPOCH};

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::runtime::events::Recorder;
use kube::{Api, Client, Error as KubeError, ResourceExt};
use serde_json::json;

use crate::events::{self, EventReason};
use crate::identity::{
    self, SOURCE_NAMESPACE_ANNOTATION, SYNCED_AT_ANNOTATION, SYNC_LABEL, SYNC_LABEL_REPLICA_VALUE,
};

/// Outcome of a single `apply` against one target namespace, per §4.B.
#[derive(Debug)]
pub enum ApplyOutcome {
    Created,
    Updated,
    SkippedUnmanaged,
    /// Create raced another writer (409); the next periodic pass resolves it.
    RaceRetry,
    Failed(KubeError),
}

/// Reads `origin.name` in `target_ns`, then creates, updates, recreates, or
/// skips it according to §4.B. Never writes to a Secret for which a fresh
/// read showed `is_replica` false (§2 "P2").
pub async fn apply(
    client: &Client,
    target_ns: &str,
    origin: &Secret,
    recorder: Option<&Recorder>,
) -> ApplyOutcome {
    let name = origin.name_any();
    let api: Api<Secret> = Api::namespaced(client.clone(), target_ns);

    let existing = match api.get_opt(&name).await {
        Ok(existing) => existing,
        Err(err) => return ApplyOutcome::Failed(err),
    };

    write(client, target_ns, &name, existing, origin, recorder).await
}

/// Performs the write phase given an already-fetched `existing` object (or
/// `None` if absent). Shared by [`apply`] and the Periodic Reconciler, which
/// performs its own read-and-compare before deciding whether a write is
/// warranted at all (§4.E.3).
pub(crate) async fn write(
    client: &Client,
    target_ns: &str,
    name: &str,
    existing: Option<Secret>,
    origin: &Secret,
    recorder: Option<&Recorder>,
) -> ApplyOutcome {
    let api: Api<Secret> = Api::namespaced(client.clone(), target_ns);

    let Some(existing) = existing else {
        return create(&api, target_ns, name, origin, recorder).await;
    };

    if !identity::is_replica(&existing) {
        tracing::warn!(
            namespace = target_ns,
            secret = name,
            "unmanaged Secret with the same name already exists, skipping sync"
        );
        if let Some(recorder) = recorder {
            events::emit(
                recorder,
                EventReason::SyncSkipped,
                format!(
                    "Secret exists but was not created by kss-operator; skipping sync from {}",
                    origin.namespace().unwrap_or_default()
                ),
                &events::secret_ref(name, target_ns),
            )
            .await;
        }
        return ApplyOutcome::SkippedUnmanaged;
    }

    // §4.B edge case: `type` is immutable under patch semantics, so a type
    // change forces delete-then-recreate (§9's accepted brief-absence window).
    if existing.type_ != origin.type_ {
        if let Err(err) = api.delete(name, &DeleteParams::default()).await {
            if !matches!(&err, KubeError::Api(resp) if resp.code == 404) {
                return ApplyOutcome::Failed(err);
            }
        }
        return create(&api, target_ns, name, origin, recorder).await;
    }

    let data_changed = existing.data != origin.data;

    let mut annotations = json!({
        SOURCE_NAMESPACE_ANNOTATION: origin.namespace().unwrap_or_default(),
    });
    if data_changed {
        annotations[SYNCED_AT_ANNOTATION] = json!(unix_seconds());
    }

    let patch = json!({
        "metadata": {
            "labels": { SYNC_LABEL: SYNC_LABEL_REPLICA_VALUE },
            "annotations": annotations,
        },
        "data": origin.data,
    });

    match api
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => ApplyOutcome::Updated,
        Err(err) => ApplyOutcome::Failed(err),
    }
}

async fn create(
    api: &Api<Secret>,
    target_ns: &str,
    name: &str,
    origin: &Secret,
    recorder: Option<&Recorder>,
) -> ApplyOutcome {
    let desired = desired_replica(target_ns, name, origin);

    match api.create(&PostParams::default(), &desired).await {
        Ok(_) => {
            if let Some(recorder) = recorder {
                events::emit(
                    recorder,
                    EventReason::SecretSynced,
                    format!("Synced Secret from namespace {}", origin.namespace().unwrap_or_default()),
                    &events::secret_ref(name, target_ns),
                )
                .await;
            }
            ApplyOutcome::Created
        }
        Err(KubeError::Api(resp)) if resp.code == 409 => ApplyOutcome::RaceRetry,
        Err(err) => ApplyOutcome::Failed(err),
    }
}

/// Builds the desired Replica object from an Origin, per §4.B.2.
fn desired_replica(target_ns: &str, name: &str, origin: &Secret) -> Secret {
    Secret {
        type_: origin.type_.clone(),
        data: origin.data.clone(),
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(target_ns.to_string()),
            labels: Some(
                [(SYNC_LABEL.to_string(), SYNC_LABEL_REPLICA_VALUE.to_string())]
                    .into_iter()
                    .collect(),
            ),
            annotations: Some(
                [
                    (
                        SOURCE_NAMESPACE_ANNOTATION.to_string(),
                        origin.namespace().unwrap_or_default(),
                    ),
                    (SYNCED_AT_ANNOTATION.to_string(), unix_seconds()),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn origin(namespace: &str, name: &str, value: &str, type_: &str) -> Secret {
        let mut data = BTreeMap::new();
        data.insert("k".to_string(), ByteString(value.as_bytes().to_vec()));
        Secret {
            type_: Some(type_.to_string()),
            data: Some(data),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(
                    [(SYNC_LABEL.to_string(), "sync".to_string())]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn desired_replica_carries_origin_payload_and_marker_metadata() {
        let o = origin("ns-a", "s1", "dg==", "Opaque");
        let replica = desired_replica("ns-b", "s1", &o);

        assert_eq!(replica.type_, o.type_);
        assert_eq!(replica.data, o.data);
        assert_eq!(
            replica.metadata.labels.as_ref().unwrap().get(SYNC_LABEL),
            Some(&SYNC_LABEL_REPLICA_VALUE.to_string())
        );
        assert_eq!(
            replica
                .metadata
                .annotations
                .as_ref()
                .unwrap()
                .get(SOURCE_NAMESPACE_ANNOTATION),
            Some(&"ns-a".to_string())
        );
        assert!(identity::is_replica(&replica));
    }

    #[test]
    fn desired_replica_with_empty_data_is_created_with_empty_data() {
        let mut o = origin("ns-a", "s1", "dg==", "Opaque");
        o.data = Some(BTreeMap::new());
        let replica = desired_replica("ns-b", "s1", &o);
        assert_eq!(replica.data, Some(BTreeMap::new()));
    }
}
