use kube::runtime::finalizer::Error as FinalizerError;

/// All errors possible to occur during reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube` crate talking to the API server.
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    /// Failed to list namespaces; §4.C.1 requires aborting the whole fan-out
    /// rather than proceeding against a partial namespace set.
    #[error("failed to list namespaces: {source}")]
    NamespaceList { source: kube::Error },

    /// Propagated from `kube::runtime::finalizer`'s wrapper around a failed
    /// apply/cleanup closure.
    #[error("finalizer error: {0}")]
    Finalizer(Box<FinalizerError<Error>>),

    /// Error in user input or Secret shape, typically a missing namespace.
    #[error("invalid Secret: {0}")]
    UserInput(String),
}

impl From<FinalizerError<Error>> for Error {
    fn from(e: FinalizerError<Error>) -> Self {
        Error::Finalizer(Box::new(e))
    }
}
