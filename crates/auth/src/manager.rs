//! Token lifecycle for the file client.
//!
//! Responsibilities:
//! - Cache the current access token in memory (never persisted).
//! - Detect expiry and acquire a fresh token through the client-credentials
//!   exchange.
//! - Keep at most one exchange in flight: concurrent callers wait for it and
//!   share its result.
use crate::client_credentials;
use async_trait::async_trait;
use mft_types::{AccessToken, Credentials, Result, TokenProvider};
use tokio::sync::Mutex;

/// [`TokenProvider`] backed by the client-credentials grant.
pub struct TokenManager {
    http: reqwest::Client,
    credentials: Credentials,
    /// Held across the exchange; this lock is the refresh guard.
    current: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    #[must_use]
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Force a fresh exchange, replacing any cached token.
    ///
    /// # Errors
    ///
    /// Propagates the error of [`client_credentials::authenticate`]; the
    /// previously cached token is dropped in that case.
    pub async fn authenticate(&self) -> Result<AccessToken> {
        let mut current = self.current.lock().await;
        current.take();
        let token = client_credentials::authenticate(&self.http, &self.credentials).await?;
        *current = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn token(&self) -> Result<AccessToken> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref()
            && !token.is_expired()
        {
            return Ok(token.clone());
        }
        let token = client_credentials::authenticate(&self.http, &self.credentials).await?;
        *current = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self, rejected: &AccessToken) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|t| t.value == rejected.value) {
            current.take();
            tracing::warn!(
                client_id = self.credentials.client_id(),
                "access token rejected, dropping cached token"
            );
        }
    }
}

/// A token obtained elsewhere, injected as-is.
///
/// Never refreshes; once it expires every call fails with an auth error.
pub struct StaticToken(AccessToken);

impl StaticToken {
    #[must_use]
    pub fn new(token: AccessToken) -> Self {
        Self(token)
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<AccessToken> {
        if self.0.is_expired() {
            return Err(mft_types::MftError::auth(
                "static access token has expired",
            ));
        }
        Ok(self.0.clone())
    }
}
