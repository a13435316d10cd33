use pixmatch_core::Error;

/// Receives the reason a search fell back to featured results
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &Error);
}

/// Default sink: log through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &Error) {
        tracing::warn!(error = %error, "Visual search failed, serving featured products");
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&Error) + Send + Sync,
{
    fn report(&self, error: &Error) {
        self(error)
    }
}
