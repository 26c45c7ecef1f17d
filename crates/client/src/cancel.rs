//! Caller-initiated cancellation.

use mft_types::{MftError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `op` against `token`.
///
/// On cancellation `op` is dropped, which aborts its HTTP call, and
/// [`MftError::Canceled`] is returned. An upload is a single request, so a
/// canceled upload leaves nothing half-written on the client side.
///
/// # Errors
///
/// [`MftError::Canceled`], or whatever `op` fails with.
pub async fn cancellable<T, F>(token: &CancellationToken, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!("operation canceled");
            Err(MftError::Canceled)
        }
        result = op => result,
    }
}
