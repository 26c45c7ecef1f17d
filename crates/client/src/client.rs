//! The managed file-transfer client.

use crate::http_util;
use bytes::Bytes;
use futures_util::stream::{self, Stream, TryStreamExt as _};
use mft_types::{
    AccessToken, ByteStream, DEFAULT_TENANT_HEADER, FileInfo, FilePage, FileReference, ListFilter,
    MftError, RequestContext, Result, TokenProvider, UploadMetadata,
};
use reqwest::{
    Method, RequestBuilder, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
};
use serde::Deserialize;
use std::{fmt, sync::Arc};

/// Header carrying the (percent-encoded) file name on upload.
pub const FILE_NAME_HEADER: &str = "x-file-name";
/// Header carrying the business type on upload.
pub const BUSINESS_TYPE_HEADER: &str = "x-business-type-id";

/// Authenticated client for the file API.
///
/// Holds no per-call state: clone it freely and call it from many tasks.
/// Every operation performs exactly one HTTP round trip; wrap calls in a
/// [`crate::RetryPolicy`] to retry.
#[derive(Clone)]
pub struct FileTransferClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    tenant_header: HeaderName,
}

impl fmt::Debug for FileTransferClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransferClient")
            .field("base_url", &self.base_url.as_str())
            .field("tenant_header", &self.tenant_header)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    file_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Paged {
        data: Vec<FileInfo>,
        #[serde(default)]
        total: Option<u64>,
    },
    Plain(Vec<FileInfo>),
}

impl FileTransferClient {
    /// Create a client for `base_url` (file resources live under
    /// `{base_url}/files`).
    ///
    /// # Errors
    ///
    /// Returns [`MftError::Validation`] if `base_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MftError::Validation(format!("invalid base url {base_url:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(MftError::Validation(format!(
                "base url must be http(s): {base_url}"
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
            tenant_header: HeaderName::from_static(DEFAULT_TENANT_HEADER),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS).
    #[must_use]
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Override the tenant header name.
    ///
    /// # Errors
    ///
    /// Returns [`MftError::Validation`] if `name` is not a valid header name.
    pub fn with_tenant_header(mut self, name: &str) -> Result<Self> {
        self.tenant_header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| MftError::Validation(format!("invalid tenant header {name:?}: {e}")))?;
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn files_url(&self, file_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| MftError::Validation("base url cannot take a path".into()))?;
            segments.pop_if_empty().push("files");
            if let Some(id) = file_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Attach exactly one bearer token and, for multi-tenant calls, exactly
    /// one tenant header. The token is handed back so a rejection can name it.
    async fn request(
        &self,
        method: Method,
        url: Url,
        context: &RequestContext,
    ) -> Result<(RequestBuilder, AccessToken)> {
        let tenant = tenant_header_value(context)?;
        let token = self.tokens.token().await?;
        let authorization = HeaderValue::from_str(&token.authorization())
            .map_err(|_| MftError::auth("access token is not a valid header value"))?;
        let mut builder = self.http.request(method, url).header(AUTHORIZATION, authorization);
        if let Some(value) = tenant {
            builder = builder.header(self.tenant_header.clone(), value);
        }
        Ok((builder, token))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        token: &AccessToken,
        subject: &str,
    ) -> Result<reqwest::Response> {
        let resp = builder.send().await?;
        match http_util::check(resp, subject).await {
            Err(err @ MftError::Auth { .. }) => {
                self.tokens.invalidate(token).await;
                Err(err)
            }
            other => other,
        }
    }

    /// Mark a file as deleted.
    ///
    /// Returns `true` once the server accepted the delete. Deleting a file
    /// that is already gone is reported as [`MftError::NotFound`], never
    /// silently treated as success.
    ///
    /// # Errors
    ///
    /// [`MftError::Validation`] for an empty id (no request is sent),
    /// [`MftError::NotFound`], [`MftError::Auth`] or [`MftError::Transport`].
    pub async fn delete_file(&self, file_id: &str, context: &RequestContext) -> Result<bool> {
        let file_id = require_file_id(file_id)?;
        tracing::debug!(file_id, %context, "deleting file");
        let (builder, token) = self
            .request(Method::DELETE, self.files_url(Some(file_id))?, context)
            .await?;
        self.send(builder, &token, file_id).await?;
        tracing::info!(file_id, "file deleted");
        Ok(true)
    }

    /// Stream `body` to the file API as a new file.
    ///
    /// The file id comes from `metadata` or is generated. If the server
    /// answers with a JSON body carrying `fileId`, that id wins.
    ///
    /// # Errors
    ///
    /// [`MftError::Validation`] for bad metadata (no request is sent),
    /// [`MftError::Transport`] if the body stream fails or the connection
    /// drops mid-transfer, [`MftError::Auth`] for a rejected token.
    pub async fn upload_file<S>(
        &self,
        context: &RequestContext,
        metadata: UploadMetadata,
        body: S,
    ) -> Result<FileReference>
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        metadata.validate()?;
        let file_id = metadata
            .file_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let content_type = HeaderValue::from_str(metadata.content_type_or_default())
            .map_err(|_| MftError::Validation("invalid content type".into()))?;
        let file_name = HeaderValue::from_str(&http_util::encode_header_value(&metadata.file_name))
            .map_err(|_| MftError::Validation("invalid file name".into()))?;

        tracing::debug!(
            %file_id,
            file_name = %metadata.file_name,
            %context,
            "uploading file"
        );
        let (builder, token) = self
            .request(Method::PUT, self.files_url(Some(&file_id))?, context)
            .await?;
        let mut builder = builder
            .header(CONTENT_TYPE, content_type)
            .header(FILE_NAME_HEADER, file_name);
        if let Some(bt) = metadata.business_type_id {
            builder = builder.header(BUSINESS_TYPE_HEADER, bt.to_string());
        }
        let resp = self
            .send(builder.body(reqwest::Body::wrap_stream(body)), &token, &file_id)
            .await?;

        let text = resp.text().await?;
        let stored_id = serde_json::from_str::<UploadResponse>(&text)
            .ok()
            .and_then(|r| r.file_id)
            .filter(|id| !id.is_empty())
            .unwrap_or(file_id);
        tracing::info!(file_id = %stored_id, "file uploaded");
        Ok(FileReference::new(stored_id, context))
    }

    /// Buffered form of [`FileTransferClient::upload_file`].
    ///
    /// # Errors
    ///
    /// Same as [`FileTransferClient::upload_file`].
    pub async fn upload_bytes(
        &self,
        context: &RequestContext,
        metadata: UploadMetadata,
        data: impl Into<Bytes>,
    ) -> Result<FileReference> {
        let chunk: Result<Bytes> = Ok(data.into());
        self.upload_file(context, metadata, stream::once(async move { chunk }))
            .await
    }

    /// Open a file for reading.
    ///
    /// The status is checked before the stream is handed out; the stream is
    /// lazy, finite and single-pass.
    ///
    /// # Errors
    ///
    /// [`MftError::NotFound`], [`MftError::Auth`] or [`MftError::Transport`];
    /// later failures arrive as `Err` items of the stream.
    pub async fn download_file(&self, file_id: &str, context: &RequestContext) -> Result<ByteStream> {
        let file_id = require_file_id(file_id)?;
        tracing::debug!(file_id, %context, "downloading file");
        let (builder, token) = self
            .request(Method::GET, self.files_url(Some(file_id))?, context)
            .await?;
        let resp = self.send(builder, &token, file_id).await?;
        Ok(http_util::byte_stream(resp))
    }

    /// Download a whole file into memory.
    ///
    /// # Errors
    ///
    /// Same as [`FileTransferClient::download_file`].
    pub async fn download_bytes(&self, file_id: &str, context: &RequestContext) -> Result<Bytes> {
        let chunks: Vec<Bytes> = self
            .download_file(file_id, context)
            .await?
            .try_collect()
            .await?;
        Ok(chunks.concat().into())
    }

    /// List one page of files visible to the token (and tenant).
    ///
    /// # Errors
    ///
    /// [`MftError::Auth`], [`MftError::Transport`], or
    /// [`MftError::Serialization`] for an unreadable listing.
    pub async fn list_files(&self, context: &RequestContext, filter: &ListFilter) -> Result<FilePage> {
        tracing::debug!(
            page_index = filter.page_index,
            page_size = filter.page_size,
            %context,
            "listing files"
        );
        let (builder, token) = self
            .request(Method::GET, self.files_url(None)?, context)
            .await?;
        let resp = self
            .send(builder.query(&filter.query_pairs()), &token, "files")
            .await?;
        let text = resp.text().await?;
        let (files, total) = match serde_json::from_str::<ListResponse>(&text)? {
            ListResponse::Paged { data, total } => (data, total),
            ListResponse::Plain(data) => (data, None),
        };
        Ok(FilePage {
            files,
            page_index: filter.page_index,
            page_size: filter.page_size,
            total,
        })
    }
}

/// File ids are sent exactly as given: blank or padded ids are rejected.
fn require_file_id(file_id: &str) -> Result<&str> {
    if file_id.trim().is_empty() {
        return Err(MftError::Validation("file id must not be empty".into()));
    }
    if file_id.trim() != file_id {
        return Err(MftError::Validation(format!(
            "file id {file_id:?} has surrounding whitespace"
        )));
    }
    Ok(file_id)
}

fn tenant_header_value(context: &RequestContext) -> Result<Option<HeaderValue>> {
    let RequestContext::MultiTenant(tenant_id) = context else {
        return Ok(None);
    };
    if tenant_id.trim().is_empty() {
        return Err(MftError::Validation("tenant id must not be empty".into()));
    }
    HeaderValue::from_str(tenant_id)
        .map(Some)
        .map_err(|_| MftError::Validation(format!("invalid tenant id {tenant_id:?}")))
}
