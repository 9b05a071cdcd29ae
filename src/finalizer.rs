//! Finalizer wiring for Origin Secrets.
//!
//! The teacher hand-patches the `finalizers` array directly
//! (`Patch::Merge` of `{"metadata": {"finalizers": [...]}}`). This crate uses
//! `kube::runtime::finalizer::finalizer` instead, grounded on the upstream
//! `kube` crate's own `examples/secret_syncer.rs`, which is the canonical
//! worked example of exactly this apply/cleanup split. The combinator
//! subsumes the teacher's hand-rolled add/remove logic, including the
//! re-entrancy guarantee §4.D requires (a redelivered finalizer event is a
//! no-op), so the teacher's `add`/`rm` functions are not carried forward.

/// Name under which this controller registers its finalizer on Origin
/// Secrets, scoping cleanup to this controller alone.
pub const FINALIZER_NAME: &str = "kss-operator.io/cleanup";
