use std::sync::Arc;

use futures::stream::StreamExt;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::Api;
use kube::runtime::watcher;
use kube::runtime::Controller;
use kube::Client;

mod config;
mod error;
mod events;
mod finalizer;
mod gc;
mod handlers;
mod identity;
mod materializer;
mod namespaces;
mod periodic;
mod planner;
mod telemetry;

use config::Config;
use handlers::ReconcilerContext;

#[tokio::main]
async fn main() {
    telemetry::init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = Config::from_env();

    // First, a Kubernetes client must be obtained using the `kube` crate.
    // `read_timeout` is set from the configured API timeout (§5 "Cancellation
    // and timeouts") so every request this client issues is bounded, rather
    // than wrapping each call site individually.
    // The client will later be moved to the controllers and the Periodic
    // Reconciler.
    let kubernetes_client = match kube::Config::infer().await {
        Ok(mut kube_config) => {
            kube_config.read_timeout = Some(config.api_timeout);
            match Client::try_from(kube_config) {
                Ok(client) => client,
                Err(err) => {
                    tracing::error!(error = %err, "failed to build Kubernetes client");
                    std::process::exit(1);
                }
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "cannot infer Kubernetes client configuration");
            std::process::exit(1);
        }
    };

    let context = Arc::new(ReconcilerContext::new(kubernetes_client.clone()));

    let periodic_handle = periodic::spawn(kubernetes_client.clone(), config);

    let secret_api: Api<Secret> = Api::all(kubernetes_client.clone());
    let namespace_api: Api<Namespace> = Api::all(kubernetes_client.clone());

    let secret_watch_config = watcher::Config::default().labels(&format!(
        "{}={}",
        identity::SYNC_LABEL,
        identity::SYNC_LABEL_ORIGIN_VALUE
    ));

    let secrets_controller = Controller::new(secret_api, secret_watch_config)
        .shutdown_on_signal()
        .run(
            handlers::reconcile_secret,
            handlers::error_policy,
            context.clone(),
        )
        .for_each(|result| async move {
            if let Err(err) = result {
                tracing::warn!(error = %err, "secret reconciliation error");
            }
        });

    let namespaces_controller = Controller::new(namespace_api, watcher::Config::default())
        .shutdown_on_signal()
        .run(
            handlers::reconcile_namespace,
            handlers::namespace_error_policy,
            context,
        )
        .for_each(|result| async move {
            if let Err(err) = result {
                tracing::warn!(error = %err, "namespace reconciliation error");
            }
        });

    tracing::info!("kss-operator started");
    tokio::join!(secrets_controller, namespaces_controller);

    periodic_handle.abort();
    tracing::info!("kss-operator shut down cleanly");
}
