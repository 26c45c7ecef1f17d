//! Async traits shared across all mft crates.
//!
//! Cross-crate abstractions live here so that the client depends only on
//! `mft-types`, not on a concrete authentication strategy.

use crate::{AccessToken, error::Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// A pinned, sendable stream of byte chunks (download bodies, upload sources).
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Supplies bearer tokens to the file client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid token, acquiring one if necessary.
    async fn token(&self) -> Result<AccessToken>;

    /// Forget `rejected` so the next [`TokenProvider::token`] call acquires a
    /// fresh one. Called when the file API rejects a token; a provider that
    /// has already moved on to a newer token keeps it.
    async fn invalidate(&self, _rejected: &AccessToken) {}
}
