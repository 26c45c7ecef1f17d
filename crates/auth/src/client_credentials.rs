//! OAuth 2.0 client-credentials token exchange.
//!
//! One form-encoded POST to the identity provider's token endpoint; the
//! response JSON carries `access_token` and, usually, `expires_in`.

use mft_types::{AccessToken, Credentials, MftError, Result, truncate_error_body};
use reqwest::header::{ACCEPT, CACHE_CONTROL};

/// Grant type sent in every token request.
pub const GRANT_TYPE: &str = "client_credentials";

/// Build the form-urlencoded parameters for the token request.
#[must_use]
pub fn token_form_params(credentials: &Credentials) -> [(&'static str, &str); 3] {
    [
        ("grant_type", GRANT_TYPE),
        ("client_id", credentials.client_id()),
        ("client_secret", credentials.client_secret()),
    ]
}

/// Parse the token endpoint JSON response into an [`AccessToken`].
///
/// # Errors
///
/// Returns [`MftError::Auth`] if `access_token` is missing or empty.
pub fn parse_token_response(json: &serde_json::Value) -> Result<AccessToken> {
    let value = json
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MftError::auth("missing access_token"))?;

    let mut token = AccessToken::new(value);
    if let Some(ty) = json.get("token_type").and_then(serde_json::Value::as_str) {
        token.token_type = Some(ty.to_string());
    }
    // Some identity providers send `expires_in` as a string.
    let expires_in = json.get("expires_in").and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    });
    if let Some(secs) = expires_in {
        token = token.with_expiry(secs);
    }
    Ok(token)
}

/// Exchange client credentials for an access token.
///
/// Performs exactly one request; retrying is up to the caller.
///
/// # Errors
///
/// Returns [`MftError::Auth`] on a non-2xx response (with the status and a
/// redacted credential summary) or an unusable body, and
/// [`MftError::Transport`] if the endpoint cannot be reached.
pub async fn authenticate(http: &reqwest::Client, credentials: &Credentials) -> Result<AccessToken> {
    let endpoint = credentials.token_endpoint();
    tracing::debug!(endpoint, client_id = credentials.client_id(), "requesting access token");

    let resp = http
        .post(endpoint)
        .header(CACHE_CONTROL, "no-cache")
        .header(ACCEPT, "application/json")
        .form(&token_form_params(credentials))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = truncate_error_body(resp.text().await.unwrap_or_default());
        return Err(MftError::Auth {
            status: Some(status.as_u16()),
            message: format!(
                "token request to {endpoint} failed, ensure the credentials are valid ({}): {body}",
                credentials.redacted()
            ),
        });
    }

    let json: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| MftError::auth(format!("failed to parse token response: {e}")))?;
    let token = parse_token_response(&json)?;
    tracing::info!(
        client_id = credentials.client_id(),
        expires_in = token.remaining_secs(),
        "access token acquired"
    );
    Ok(token)
}
