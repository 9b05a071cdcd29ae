//! Component A — Replica Identity Oracle.
//!
//! `is_replica` is the single predicate every other component defers to when
//! deciding whether a Secret is a controller-owned copy. It is deliberately
//! based on annotations only: labels are an advisory selector hint and must
//! never be load-bearing for identity (a user who strips the label from a
//! replica must still have it recognised as one).

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

/// Opt-in label a user sets on an Origin Secret: `kss-operator/sync=sync`.
pub const SYNC_LABEL: &str = "kss-operator/sync";
/// Value of [`SYNC_LABEL`] that opts a Secret in as an Origin.
pub const SYNC_LABEL_ORIGIN_VALUE: &str = "sync";
/// Value of [`SYNC_LABEL`] the controller writes on Replicas (selector hint only).
pub const SYNC_LABEL_REPLICA_VALUE: &str = "synced";
/// Authoritative Replica identity marker: names the Origin's namespace.
pub const SOURCE_NAMESPACE_ANNOTATION: &str = "kss-operator/source-namespace";
/// Advisory last-write marker, refreshed only when data/type actually changes.
pub const SYNCED_AT_ANNOTATION: &str = "kss-operator/synced-at";

/// True iff `secret` carries the source-namespace annotation, regardless of
/// its labels. This is the only identity test the controller trusts.
pub fn is_replica(secret: &Secret) -> bool {
    annotation(secret, SOURCE_NAMESPACE_ANNOTATION).is_some()
}

/// Reads the source namespace a Replica was synced from, if any.
pub fn source_namespace(secret: &Secret) -> Option<&str> {
    annotation(secret, SOURCE_NAMESPACE_ANNOTATION)
}

/// Looks up a single annotation value by key.
pub fn annotation<'a>(secret: &'a Secret, key: &str) -> Option<&'a str> {
    secret.annotations().get(key).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn secret(labels: &[(&str, &str)], annotations: &[(&str, &str)]) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("s1".into()),
                namespace: Some("ns-a".into()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn origin_has_label_and_no_annotation() {
        let s = secret(&[(SYNC_LABEL, SYNC_LABEL_ORIGIN_VALUE)], &[]);
        assert!(!is_replica(&s));
    }

    #[test]
    fn replica_is_identified_by_annotation_alone() {
        let s = secret(
            &[(SYNC_LABEL, SYNC_LABEL_REPLICA_VALUE)],
            &[(SOURCE_NAMESPACE_ANNOTATION, "ns-a")],
        );
        assert!(is_replica(&s));
        assert_eq!(source_namespace(&s), Some("ns-a"));
    }

    #[test]
    fn replica_stripped_of_its_label_is_still_a_replica() {
        // The annotation is authoritative; label is advisory only (§3 invariant 2).
        let s = secret(&[], &[(SOURCE_NAMESPACE_ANNOTATION, "ns-a")]);
        assert!(is_replica(&s));
    }

    #[test]
    fn unmanaged_secret_with_synced_label_but_no_annotation_is_not_a_replica() {
        // §3: "a Secret with the replica-marker label 'synced' but lacking the
        // annotation must still be treated as Unmanaged".
        let s = secret(&[(SYNC_LABEL, SYNC_LABEL_REPLICA_VALUE)], &[]);
        assert!(!is_replica(&s));
    }
}
