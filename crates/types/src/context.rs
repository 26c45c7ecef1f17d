//! Tenant scoping and file addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default header carrying the tenant id for multi-tenant tokens.
pub const DEFAULT_TENANT_HEADER: &str = "x-raet-tenant-id";

/// Whether a request is scoped to an explicit tenant.
///
/// A single-tenant token already implies its tenant, so no header is sent.
/// A multi-tenant token needs the tenant id on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tenant_id")]
pub enum RequestContext {
    #[default]
    SingleTenant,
    MultiTenant(String),
}

impl RequestContext {
    /// Map an optional tenant id; `None` and blank strings mean single-tenant.
    #[must_use]
    pub fn from_tenant(tenant_id: Option<&str>) -> Self {
        match tenant_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::MultiTenant(id.to_string()),
            _ => Self::SingleTenant,
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::SingleTenant => None,
            Self::MultiTenant(id) => Some(id),
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleTenant => write!(f, "single-tenant"),
            Self::MultiTenant(id) => write!(f, "tenant {id}"),
        }
    }
}

/// Identifies a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl FileReference {
    pub fn new(file_id: impl Into<String>, context: &RequestContext) -> Self {
        Self {
            file_id: file_id.into(),
            tenant_id: context.tenant_id().map(str::to_string),
        }
    }

    /// The context to use when addressing this file again.
    #[must_use]
    pub fn context(&self) -> RequestContext {
        RequestContext::from_tenant(self.tenant_id.as_deref())
    }
}
