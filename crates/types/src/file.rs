//! Upload metadata and listing types.

use crate::{MftError, error::Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Describes a file about to be uploaded.
///
/// ```
/// use mft_types::UploadMetadata;
///
/// let meta = UploadMetadata::builder()
///     .file_name("payroll.csv")
///     .content_type("text/csv")
///     .build();
/// assert!(meta.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct UploadMetadata {
    /// Name the file is stored under on the remote side.
    #[builder(into)]
    pub file_name: String,
    /// Explicit file id; a fresh one is generated when absent.
    #[builder(into)]
    pub file_id: Option<String>,
    pub business_type_id: Option<i64>,
    #[builder(into)]
    pub content_type: Option<String>,
}

impl UploadMetadata {
    /// Check the metadata without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`MftError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(MftError::Validation("file name must not be empty".into()));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(MftError::Validation(format!(
                "file name must not contain path components: {name:?}"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(MftError::Validation(
                "file name must not contain control characters".into(),
            ));
        }
        if let Some(id) = &self.file_id
            && id.trim().is_empty()
        {
            return Err(MftError::Validation("file id must not be blank".into()));
        }
        if let Some(ct) = &self.content_type
            && !is_media_type(ct)
        {
            return Err(MftError::Validation(format!("invalid content type: {ct:?}")));
        }
        if let Some(bt) = self.business_type_id
            && bt <= 0
        {
            return Err(MftError::Validation(format!(
                "business type id must be positive, got {bt}"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// `type/subtype` with optional parameters, no whitespace in the essence.
fn is_media_type(s: &str) -> bool {
    let essence = s.split(';').next().unwrap_or_default().trim();
    let Some((ty, sub)) = essence.split_once('/') else {
        return false;
    };
    let token = |t: &str| {
        !t.is_empty()
            && t.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    token(ty) && token(sub)
}

/// One entry of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_id: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

/// Paging and filtering for file listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub page_index: u32,
    pub page_size: u32,
    pub business_type_id: Option<i64>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: 50,
            business_type_id: None,
        }
    }
}

impl ListFilter {
    /// Query parameters in the order the file API documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pageIndex", self.page_index.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(bt) = self.business_type_id {
            pairs.push(("businessTypeId", bt.to_string()));
        }
        pairs
    }
}

/// One page of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePage {
    pub files: Vec<FileInfo>,
    pub page_index: u32,
    pub page_size: u32,
    pub total: Option<u64>,
}
