//! Unified error type for the mft workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across mft crates.
#[derive(Debug, Error)]
pub enum MftError {
    /// Bad or expired credentials, or a token rejected by the file API.
    #[error("authentication error{}: {message}", fmt_status(.status.as_ref()))]
    Auth { status: Option<u16>, message: String },

    /// The addressed file does not exist (or no longer exists) on the server.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before any request is sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure, timeout, broken stream or a transient server status.
    #[error("transport error{}: {message}", fmt_status(.status.as_ref()))]
    Transport { status: Option<u16>, message: String },

    /// The caller aborted the operation.
    #[error("operation canceled")]
    Canceled,

    /// The file API returned a status outside the known taxonomy.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Error bodies longer than this many bytes are cut before being put into an
/// error.
pub const MAX_ERROR_BODY: usize = 512;

/// Cut `body` to at most [`MAX_ERROR_BODY`] bytes on a char boundary.
#[must_use]
pub fn truncate_error_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

fn fmt_status(status: Option<&u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl MftError {
    /// Shorthand for an [`MftError::Auth`] without an HTTP status.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for an [`MftError::Transport`] without an HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The HTTP status attached to this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Transport { status, .. } => *status,
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for MftError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        Self::Transport {
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MftError>;
