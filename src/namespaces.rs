//! Namespace enumeration, shared by the Fan-out Planner (§4.C), the Garbage
//! Collector (§4.F) and the Periodic Reconciler (§4.E) — all three need the
//! same "list all namespaces, abort on failure" step the teacher's
//! `sync_secret` inlines once.

use k8s_openapi::api::core::v1::Namespace;
use kube::api::ListParams;
use kube::{Api, Client, ResourceExt};

use crate::error::Error;

/// Lists the names of every namespace in the cluster.
///
/// A `Terminating` namespace is still returned here (§4.C.3): the caller will
/// attempt a write against it and record the resulting failure, rather than
/// this function silently filtering it out.
pub async fn list_all(client: &Client) -> Result<Vec<String>, Error> {
    let api: Api<Namespace> = Api::all(client.clone());
    let namespaces = api
        .list(&ListParams::default())
        .await
        .map_err(|source| Error::NamespaceList { source })?;
    Ok(namespaces.iter().map(|ns| ns.name_any()).collect())
}

/// Namespace names excluding the origin's own namespace — the set of target
/// namespaces for a single fan-out or garbage-collection pass.
pub async fn targets_for(client: &Client, origin_ns: &str) -> Result<Vec<String>, Error> {
    let all = list_all(client).await?;
    Ok(all.into_iter().filter(|ns| ns != origin_ns).collect())
}
