//! Core types and traits for the mft workspace.
//!
//! This crate defines the shared abstractions used by every layer of the
//! managed file-transfer client: the error taxonomy, access tokens and
//! client credentials, tenant scoping, file metadata, and the token provider
//! trait the client is injected with.

pub mod context;
pub mod credentials;
pub mod error;
pub mod file;
pub mod token;
pub mod traits;

pub use context::{DEFAULT_TENANT_HEADER, FileReference, RequestContext};
pub use credentials::Credentials;
pub use error::{MAX_ERROR_BODY, MftError, Result, truncate_error_body};
pub use file::{FileInfo, FilePage, ListFilter, UploadMetadata};
pub use token::AccessToken;
pub use traits::{ByteStream, TokenProvider};
