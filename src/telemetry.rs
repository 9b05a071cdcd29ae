//! Structured logging setup.
//!
//! Grounded on `eosin-platform-eosin` and `octopilot-secret-manager-controller`,
//! both of which initialize `tracing_subscriber::fmt()` with an `EnvFilter`
//! defaulting to an info-level filter scoped to the crate.

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kss_operator=info,kube=info".into()),
        )
        .init();
}
