//! Authentication against the identity provider.
//!
//! [`client_credentials`] performs the OAuth 2.0 client-credentials token
//! exchange. The [`TokenManager`] caches the resulting token and refreshes it
//! with at most one exchange in flight.

pub mod client_credentials;
pub mod manager;

#[cfg(test)]
mod stub;

pub use client_credentials::authenticate;
pub use manager::{StaticToken, TokenManager};
