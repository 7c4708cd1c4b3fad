//! Cooperative cancellation.

use tokio_util::sync::CancellationToken;

/// Cloneable cancellation handle shared between a caller and a running pipeline.
///
/// The pipeline checks the token before starting each level and each tile.
/// Tiles already being written are finished. Only the synchronous half of
/// [`CancellationToken`] is used, so no async runtime is needed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// The underlying token, for callers that also drive async work.
    pub fn as_cancellation_token(&self) -> &CancellationToken {
        &self.inner
    }
}

impl From<CancellationToken> for CancelToken {
    fn from(inner: CancellationToken) -> Self {
        Self { inner }
    }
}
