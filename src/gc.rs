//! Component F — Replica Garbage Collector.
//!
//! On Origin deletion, removes every Replica across the cluster while
//! leaving Unmanaged Secrets with the same name untouched. Grounded on the
//! teacher's `secret_cleanup`, but deliberately NOT on its mechanism: the
//! teacher lists candidates by label selector
//! (`eu.fitzek.spread.owner=<uid>`) and deletes them unconditionally, which
//! means a user who strips the label escapes cleanup. §4.F requires a
//! per-namespace read of the annotation instead, since the annotation is
//! authoritative and the label is not.

use k8s_openapi::api::core::v1::Secret;
use kube::api::DeleteParams;
use kube::runtime::events::Recorder;
use kube::{Api, Client, Error as KubeError};

use crate::error::Error;
use crate::events::{self, EventReason};
use crate::identity;
use crate::namespaces;

/// Aggregate result of one garbage-collection pass over a deleted Origin.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub deleted: u32,
    pub skipped_unmanaged: u32,
    pub failed: u32,
}

/// Deletes every Replica of `(origin_name, origin_ns)` across the cluster.
/// Per-namespace errors are logged and counted; the pass never aborts on one
/// namespace's failure (§4.F.3).
pub async fn gc_origin(
    client: &Client,
    origin_name: &str,
    origin_ns: &str,
    recorder: Option<&Recorder>,
) -> Result<Summary, Error> {
    let targets = namespaces::targets_for(client, origin_ns).await?;

    let mut summary = Summary::default();
    for ns in targets {
        let api: Api<Secret> = Api::namespaced(client.clone(), &ns);
        match api.get_opt(origin_name).await {
            Ok(None) => {}
            Ok(Some(secret)) if identity::is_replica(&secret) => {
                match api.delete(origin_name, &DeleteParams::default()).await {
                    Ok(_) => {
                        summary.deleted += 1;
                        if let Some(recorder) = recorder {
                            events::emit(
                                recorder,
                                EventReason::SyncedSecretDeleted,
                                format!("Deleted synced copy in namespace {ns}"),
                                &events::secret_ref(origin_name, &ns),
                            )
                            .await;
                        }
                    }
                    Err(KubeError::Api(resp)) if resp.code == 404 => {}
                    Err(err) => {
                        tracing::warn!(namespace = %ns, secret = origin_name, error = %err, "failed to delete replica during gc");
                        summary.failed += 1;
                    }
                }
            }
            Ok(Some(_)) => {
                // Unmanaged Secret with the same name — left untouched (§3 invariant 4).
                summary.skipped_unmanaged += 1;
            }
            Err(err) => {
                tracing::warn!(namespace = %ns, secret = origin_name, error = %err, "failed to read candidate secret during gc");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
