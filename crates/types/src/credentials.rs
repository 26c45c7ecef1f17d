//! Client-credentials grant inputs.

use crate::{MftError, error::Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// OAuth 2.0 client credentials plus the token endpoint they are valid for.
///
/// Immutable once constructed. The secret is only reachable through
/// [`Credentials::client_secret`]; `Debug` and [`Credentials::redacted`]
/// never include it.
pub struct Credentials {
    client_id: String,
    client_secret: SecretString,
    token_endpoint: String,
}

impl Credentials {
    /// Build credentials, rejecting empty fields.
    ///
    /// # Errors
    ///
    /// Returns [`MftError::Validation`] if any field is empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let token_endpoint = token_endpoint.into();
        if client_id.trim().is_empty() {
            return Err(MftError::Validation("client_id must not be empty".into()));
        }
        if client_secret.is_empty() {
            return Err(MftError::Validation(
                "client_secret must not be empty".into(),
            ));
        }
        if token_endpoint.trim().is_empty() {
            return Err(MftError::Validation(
                "token_endpoint must not be empty".into(),
            ));
        }
        Ok(Self {
            client_id,
            client_secret: SecretString::from(client_secret),
            token_endpoint,
        })
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }

    #[must_use]
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// Summary safe to embed in errors and logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        format!("client_id=<{}> client_secret=<redacted>", self.client_id)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}
