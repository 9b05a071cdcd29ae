//! Component C — Fan-out Planner.
//!
//! Enumerates target namespaces for an Origin and drives the Materializer
//! across all of them, collecting per-target outcomes. Grounded on the
//! teacher's `sync_secret`, whose outer `for ns in namespaces` loop this
//! module is a direct extraction of — the teacher only has one call site for
//! this loop, but the spec needs the same fan-out from both the watch
//! handlers (§4.D) and the Periodic Reconciler (§4.E), so it is factored out
//! here rather than duplicated.

use k8s_openapi::api::core::v1::Secret;
use kube::runtime::events::Recorder;
use kube::{Client, ResourceExt};

use crate::error::Error;
use crate::materializer::{self, ApplyOutcome};
use crate::namespaces;

/// Aggregate result of applying one Origin to every other namespace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
    pub race_retry: u32,
    pub failed: u32,
}

impl Summary {
    fn record(&mut self, outcome: &ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Updated => self.updated += 1,
            ApplyOutcome::SkippedUnmanaged => self.skipped += 1,
            ApplyOutcome::RaceRetry => self.race_retry += 1,
            ApplyOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Total per-target outcomes folded into this summary.
    pub fn total(&self) -> u32 {
        self.created + self.updated + self.skipped + self.race_retry + self.failed
    }
}

/// Applies `origin` to every namespace other than its own, collecting the
/// aggregate outcome. Aborts immediately (without touching any namespace) if
/// the namespace list itself cannot be obtained (§4.C.1) — a partial
/// namespace set is never an acceptable basis for a fan-out pass.
pub async fn sync_origin(
    client: &Client,
    origin: &Secret,
    recorder: Option<&Recorder>,
) -> Result<Summary, Error> {
    let origin_ns = origin.namespace().unwrap_or_default();
    let targets = namespaces::targets_for(client, &origin_ns).await?;

    let mut summary = Summary::default();
    for ns in targets {
        let outcome = materializer::apply(client, &ns, origin, recorder).await;
        if let ApplyOutcome::Failed(err) = &outcome {
            tracing::warn!(namespace = %ns, secret = %origin.name_any(), error = %err, "apply failed for target namespace");
        }
        summary.record(&outcome);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_accumulates_every_outcome_kind() {
        let mut s = Summary::default();
        s.record(&ApplyOutcome::Created);
        s.record(&ApplyOutcome::Updated);
        s.record(&ApplyOutcome::SkippedUnmanaged);
        s.record(&ApplyOutcome::RaceRetry);
        let api_err = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".into(),
            message: "boom".into(),
            reason: "InternalError".into(),
            code: 500,
        });
        s.record(&ApplyOutcome::Failed(api_err));

        assert_eq!(s.created, 1);
        assert_eq!(s.updated, 1);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.race_retry, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.total(), 5);
    }
}
