//! Shared HTTP response handling for the file client.
//!
//! Every operation goes through the same send → status-check path so the
//! mapping from HTTP status to [`MftError`] lives in one place.

use futures_util::StreamExt as _;
use mft_types::{ByteStream, MftError, Result, truncate_error_body};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Map a non-success status to the error taxonomy.
///
/// `subject` names what was addressed (usually the file id) and is used for
/// [`MftError::NotFound`].
#[must_use]
pub fn classify(status: u16, subject: &str, body: String) -> MftError {
    match status {
        401 | 403 => MftError::Auth {
            status: Some(status),
            message: if body.is_empty() {
                "access token rejected".into()
            } else {
                body
            },
        },
        404 | 410 => MftError::NotFound(subject.to_string()),
        400 | 422 => MftError::Validation(body),
        408 | 429 | 500..=599 => MftError::Transport {
            status: Some(status),
            message: body,
        },
        _ => MftError::Upstream { status, body },
    }
}

/// Pass 2xx responses through; turn anything else into an error.
///
/// # Errors
///
/// Returns the [`classify`]-ed error for non-success statuses.
pub async fn check(resp: reqwest::Response, subject: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = truncate_error_body(resp.text().await.unwrap_or_default());
    Err(classify(status.as_u16(), subject, body))
}

/// Converts a response body into a [`ByteStream`]; mid-stream failures
/// surface as transport errors.
#[must_use]
pub fn byte_stream(resp: reqwest::Response) -> ByteStream {
    Box::pin(resp.bytes_stream().map(|r| r.map_err(MftError::from)))
}

/// Controls and `%` are escaped; non-ASCII is always escaped as UTF-8.
const HEADER_VALUE: &AsciiSet = &CONTROLS.add(b'%');

/// Percent-encode everything outside visible ASCII so arbitrary file names
/// fit in a header value.
#[must_use]
pub fn encode_header_value(value: &str) -> String {
    utf8_percent_encode(value, HEADER_VALUE).to_string()
}
