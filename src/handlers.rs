//! Component D — Event Handlers.
//!
//! Translates watch events into Planner/Garbage-Collector invocations and
//! filters out replica-originated events to prevent feedback loops.
//! Reconciler shape (`Arc<T>`/`Arc<Context>` → `Action`) grounded on
//! `eosin-platform-eosin`'s `clusters/reconcile.rs`; the teacher's pre-1.0
//! `Context<T>`/`ReconcilerAction` API predates the modern `kube` release
//! this crate depends on. The Origin create/update/delete handling itself is
//! grounded on the teacher's `reconcile`/`sync_secret`/`secret_cleanup`.

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::{Api, ListParams};
use kube::runtime::controller::Action;
use kube::runtime::events::Recorder;
use kube::runtime::finalizer::{finalizer, Event as FinalizerEvent};
use kube::{Client, ResourceExt};

use crate::error::Error;
use crate::events::{self, EventReason};
use crate::finalizer::FINALIZER_NAME;
use crate::gc;
use crate::identity;
use crate::materializer;
use crate::planner;

/// Context shared across every reconciliation invocation.
pub struct ReconcilerContext {
    pub client: Client,
}

impl ReconcilerContext {
    pub fn new(client: Client) -> Self {
        ReconcilerContext { client }
    }
}

/// Reconciler entry point for watched Secrets (create/update/delete).
///
/// Re-reads the object from the API server before acting, rather than
/// trusting the watch-delivered body, per §4.D and §5 "Ordering guarantees":
/// each event must observe API server state at handler time, not at event
/// generation time.
pub async fn reconcile_secret(secret: Arc<Secret>, ctx: Arc<ReconcilerContext>) -> Result<Action, Error> {
    if identity::is_replica(&secret) {
        // Loop prevention (§5): the controller's own writes echo back as
        // watch events; this check is the load-bearing backstop that drops
        // them at the handler entry.
        return Ok(Action::await_change());
    }

    let namespace = secret.namespace().ok_or_else(|| {
        Error::UserInput("Expected Secret resource to be namespaced".to_owned())
    })?;
    let name = secret.name_any();

    let api: Api<Secret> = Api::namespaced(ctx.client.clone(), &namespace);
    let fresh = api.get(&name).await?;

    if identity::is_replica(&fresh) {
        return Ok(Action::await_change());
    }

    let recorder = events::recorder(ctx.client.clone());

    finalizer(&api, FINALIZER_NAME, fresh, |event| async {
        match event {
            FinalizerEvent::Apply(origin) => sync(&ctx.client, &origin, &recorder).await,
            FinalizerEvent::Cleanup(origin) => cleanup(&ctx.client, &origin, &recorder).await,
        }
    })
    .await
    .map_err(Error::from)
}

async fn sync(client: &Client, origin: &Secret, recorder: &Recorder) -> Result<Action, Error> {
    let name = origin.name_any();
    let namespace = origin.namespace().unwrap_or_default();
    let origin_ref = events::secret_ref(&name, &namespace);

    events::emit(
        recorder,
        EventReason::SyncTriggered,
        format!("Syncing Secret '{name}' from namespace '{namespace}'"),
        &origin_ref,
    )
    .await;

    let summary = planner::sync_origin(client, origin, Some(recorder)).await?;

    tracing::info!(
        secret = %name,
        namespace = %namespace,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        race_retry = summary.race_retry,
        failed = summary.failed,
        "fan-out complete"
    );

    if summary.failed > 0 {
        events::emit(
            recorder,
            EventReason::SyncFailed,
            format!("{} of {} target namespaces failed to sync", summary.failed, summary.total()),
            &origin_ref,
        )
        .await;
    } else {
        events::emit(
            recorder,
            EventReason::SecretSynced,
            "Sync complete".to_string(),
            &origin_ref,
        )
        .await;
    }

    Ok(Action::requeue(Duration::from_secs(60)))
}

async fn cleanup(client: &Client, origin: &Secret, recorder: &Recorder) -> Result<Action, Error> {
    let name = origin.name_any();
    let namespace = origin.namespace().unwrap_or_default();

    let summary = gc::gc_origin(client, &name, &namespace, Some(recorder)).await?;

    tracing::info!(
        secret = %name,
        namespace = %namespace,
        deleted = summary.deleted,
        skipped_unmanaged = summary.skipped_unmanaged,
        failed = summary.failed,
        "garbage collection complete"
    );

    Ok(Action::await_change())
}

/// Reconciler entry point for `Namespace` creation. Unlike the Secret
/// handler, this only ever applies to the single new namespace, so the full
/// Fan-out Planner (which lists every namespace) is deliberately not used
/// (§4.D, third bullet).
pub async fn reconcile_namespace(
    ns: Arc<Namespace>,
    ctx: Arc<ReconcilerContext>,
) -> Result<Action, Error> {
    let new_ns = ns.name_any();

    let secret_api: Api<Secret> = Api::all(ctx.client.clone());
    let lp = ListParams::default().labels(&format!(
        "{}={}",
        identity::SYNC_LABEL,
        identity::SYNC_LABEL_ORIGIN_VALUE
    ));
    let candidates = secret_api.list(&lp).await?;

    let recorder = events::recorder(ctx.client.clone());
    for origin in candidates.items.iter().filter(|s| !identity::is_replica(s)) {
        if origin.namespace().as_deref() == Some(new_ns.as_str()) {
            continue;
        }
        let name = origin.name_any();
        let outcome = materializer::apply(&ctx.client, &new_ns, origin, Some(&recorder)).await;
        if let materializer::ApplyOutcome::Failed(err) = &outcome {
            tracing::warn!(
                secret = %name,
                namespace = %new_ns,
                origin_namespace = %origin.namespace().unwrap_or_default(),
                error = %err,
                "failed to sync origin into newly created namespace"
            );
            events::emit(
                &recorder,
                EventReason::SyncFailed,
                format!("Failed to sync into new namespace {new_ns}: {err}"),
                &events::secret_ref(&name, &new_ns),
            )
            .await;
        }
    }

    Ok(Action::await_change())
}

/// Called whenever a reconciliation returns an `Err`. Requeues after a short
/// delay so transient API errors (§7) get retried with backoff.
pub fn error_policy(_secret: Arc<Secret>, error: &Error, _ctx: Arc<ReconcilerContext>) -> Action {
    tracing::error!(error = %error, "reconciliation error");
    Action::requeue(Duration::from_secs(5))
}

/// Error policy for the Namespace controller.
pub fn namespace_error_policy(
    _ns: Arc<Namespace>,
    error: &Error,
    _ctx: Arc<ReconcilerContext>,
) -> Action {
    tracing::error!(error = %error, "namespace reconciliation error");
    Action::requeue(Duration::from_secs(5))
}
