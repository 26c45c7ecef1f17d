//! Client for the managed file-transfer API.
//!
//! [`FileTransferClient`] turns delete / upload / download / list calls into
//! authenticated HTTP requests and maps the responses onto
//! [`mft_types::MftError`]. Tokens come from an injected
//! [`mft_types::TokenProvider`]; retries ([`RetryPolicy`]) and cancellation
//! ([`cancellable`]) are opt-in wrappers owned by the caller.

pub mod cancel;
pub mod client;
pub mod http_util;
pub mod retry;

#[cfg(test)]
mod stub;

pub use cancel::cancellable;
pub use client::FileTransferClient;
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
