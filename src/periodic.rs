//! Component E — Periodic Reconciler.
//!
//! On a fixed cadence, re-derives the desired state for every Origin and
//! drives convergence, recovering missed events and drift (§4.E). Implements
//! "option (a)" from §9 Design Notes: a single global ticker that walks every
//! Origin listed via the label selector, rather than one task per Origin.
//!
//! The Origins are (re-)listed straight from the API server on every tick —
//! `Api::list` always hits the server directly, never an informer cache — so
//! this naturally satisfies §4.E.1's "treat the cached body as a trigger
//! only" requirement without a second explicit re-read.

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};

use crate::config::Config;
use crate::events::{self, EventReason};
use crate::identity::{self, SYNC_LABEL, SYNC_LABEL_ORIGIN_VALUE};
use crate::materializer::{self, ApplyOutcome};

/// Spawns the periodic reconciliation loop as a background task.
pub fn spawn(client: Client, config: Config) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.reconcile_period);
        loop {
            interval.tick().await;
            tick(&client).await;
        }
    })
}

async fn tick(client: &Client) {
    tracing::debug!("periodic reconciliation tick starting");

    let origins = match list_origins(client).await {
        Ok(origins) => origins,
        Err(err) => {
            tracing::warn!(error = %err, "failed to list origins for periodic reconciliation");
            return;
        }
    };

    for origin in &origins {
        if let Err(err) = reconcile_one(client, origin).await {
            tracing::warn!(
                namespace = %origin.namespace().unwrap_or_default(),
                secret = %origin.name_any(),
                error = %err,
                "periodic reconciliation failed to list namespaces for origin"
            );
        }
    }

    tracing::debug!(origins = origins.len(), "periodic reconciliation tick complete");
}

async fn list_origins(client: &Client) -> Result<Vec<Secret>, kube::Error> {
    let api: Api<Secret> = Api::all(client.clone());
    let lp = ListParams::default().labels(&format!("{SYNC_LABEL}={SYNC_LABEL_ORIGIN_VALUE}"));
    let list = api.list(&lp).await?;
    Ok(list
        .items
        .into_iter()
        .filter(|secret| !identity::is_replica(secret))
        .collect())
}

/// Drives one Origin toward convergence across every other namespace,
/// per the branches enumerated in §4.E.3. Per-namespace errors are logged and
/// counted but never abort the tick (§4.E.4); only a failure to list
/// namespaces at all is surfaced to the caller.
async fn reconcile_one(client: &Client, origin: &Secret) -> Result<(), crate::error::Error> {
    let origin_ns = origin.namespace().unwrap_or_default();
    let name = origin.name_any();
    let targets = crate::namespaces::targets_for(client, &origin_ns).await?;
    let recorder = events::recorder(client.clone());

    for ns in targets {
        let api: Api<Secret> = Api::namespaced(client.clone(), &ns);
        let existing = match api.get_opt(&name).await {
            Ok(existing) => existing,
            Err(err) => {
                tracing::warn!(namespace = %ns, secret = %name, error = %err, "failed to read target secret during periodic reconciliation");
                continue;
            }
        };

        // §4.E.3: already-converged Replicas need no write at all.
        if let Some(existing) = &existing {
            if identity::is_replica(existing)
                && existing.type_ == origin.type_
                && existing.data == origin.data
            {
                continue;
            }
        }

        let outcome = materializer::write(client, &ns, &name, existing, origin, Some(&recorder)).await;
        match outcome {
            // A patch-update outcome here means this tick itself detected and
            // repaired drift a watch event was never delivered for — worth a
            // distinct reason from the watch-driven `SecretSynced` create path.
            ApplyOutcome::Updated => {
                events::emit(
                    &recorder,
                    EventReason::SecretReconciled,
                    format!("Repaired drifted Secret in namespace {ns} during periodic reconciliation"),
                    &events::secret_ref(&name, &ns),
                )
                .await;
            }
            ApplyOutcome::Failed(err) => {
                tracing::warn!(namespace = %ns, secret = %name, error = %err, "periodic reconciliation failed to apply target secret");
            }
            ApplyOutcome::Created | ApplyOutcome::SkippedUnmanaged | ApplyOutcome::RaceRetry => {}
        }
    }

    Ok(())
}
