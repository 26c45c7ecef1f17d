//! In-process file API used by the tests.

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use mft_types::{AccessToken, DEFAULT_TENANT_HEADER, Result, TokenProvider};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// The only token the stub accepts.
pub(crate) const TOKEN: &str = "abc123";

/// What the stub saw on the most recent request.
#[derive(Debug, Clone, Default)]
pub(crate) struct SeenRequest {
    pub authorization: Vec<String>,
    pub tenant: Vec<String>,
    pub file_name: Option<String>,
    pub business_type: Option<String>,
    pub content_type: Option<String>,
    pub query: Option<String>,
}

#[derive(Default)]
struct Inner {
    /// `(tenant, file id)` → `(file name, bytes)`; tenant is `""` for single-tenant.
    files: HashMap<(String, String), (String, Vec<u8>)>,
    last: SeenRequest,
    id_prefix: Option<String>,
    /// Raw JSON answered by the listing instead of the stored files.
    list_body: Option<String>,
}

#[derive(Clone)]
struct StubState {
    inner: Arc<Mutex<Inner>>,
    requests: Arc<AtomicUsize>,
    tenant_header: &'static str,
}

pub(crate) struct FileStub {
    pub base_url: String,
    state: StubState,
}

impl FileStub {
    pub async fn spawn() -> Self {
        Self::spawn_with_tenant_header(DEFAULT_TENANT_HEADER).await
    }

    pub async fn spawn_with_tenant_header(tenant_header: &'static str) -> Self {
        let state = StubState {
            inner: Arc::default(),
            requests: Arc::default(),
            tenant_header,
        };
        let app = Router::new()
            .route("/api/files", get(list))
            .route("/api/files/{id}", get(download).put(upload).delete(delete))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    pub fn insert(&self, tenant: &str, id: &str, data: &[u8]) {
        self.state.inner.lock().unwrap().files.insert(
            (tenant.to_string(), id.to_string()),
            (format!("{id}.bin"), data.to_vec()),
        );
    }

    pub fn contains(&self, tenant: &str, id: &str) -> bool {
        self.state
            .inner
            .lock()
            .unwrap()
            .files
            .contains_key(&(tenant.to_string(), id.to_string()))
    }

    /// From now on, store uploads under `{prefix}{requested id}` and say so.
    pub fn assign_ids(&self, prefix: &str) {
        self.state.inner.lock().unwrap().id_prefix = Some(prefix.to_string());
    }

    pub fn list_body(&self, raw: &str) {
        self.state.inner.lock().unwrap().list_body = Some(raw.to_string());
    }

    pub fn last_request(&self) -> SeenRequest {
        self.state.inner.lock().unwrap().last.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

fn header_values(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .collect()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.to_str().unwrap_or_default().to_string())
}

/// Record the request and return the tenant key, or the 401 to send back.
fn admit(state: &StubState, headers: &HeaderMap, query: Option<String>) -> std::result::Result<String, Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let seen = SeenRequest {
        authorization: header_values(headers, AUTHORIZATION.as_str()),
        tenant: header_values(headers, state.tenant_header),
        file_name: header(headers, "x-file-name"),
        business_type: header(headers, "x-business-type-id"),
        content_type: header(headers, CONTENT_TYPE.as_str()),
        query,
    };
    let authorized = seen.authorization == [format!("Bearer {TOKEN}")];
    let tenant = seen.tenant.first().cloned().unwrap_or_default();
    state.inner.lock().unwrap().last = seen;
    if authorized {
        Ok(tenant)
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid token").into_response())
    }
}

async fn list(
    State(state): State<StubState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let tenant = match admit(&state, &headers, query) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let inner = state.inner.lock().unwrap();
    if let Some(raw) = &inner.list_body {
        return ([(CONTENT_TYPE, "application/json")], raw.clone()).into_response();
    }
    let data: Vec<_> = inner
        .files
        .iter()
        .filter(|((t, _), _)| *t == tenant)
        .map(|((_, id), (name, bytes))| {
            json!({"fileId": id, "fileName": name, "fileSize": bytes.len()})
        })
        .collect();
    let total = data.len();
    Json(json!({"data": data, "total": total})).into_response()
}

async fn download(
    State(state): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let tenant = match admit(&state, &headers, None) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let found = state.inner.lock().unwrap().files.get(&(tenant, id)).cloned();
    match found {
        Some((_, bytes)) => bytes.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn upload(
    State(state): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let tenant = match admit(&state, &headers, None) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let mut inner = state.inner.lock().unwrap();
    let stored_id = match &inner.id_prefix {
        Some(prefix) => format!("{prefix}{id}"),
        None => id,
    };
    let name = header(&headers, "x-file-name").unwrap_or_default();
    inner
        .files
        .insert((tenant, stored_id.clone()), (name, body.to_vec()));
    (StatusCode::CREATED, Json(json!({"fileId": stored_id}))).into_response()
}

async fn delete(
    State(state): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let tenant = match admit(&state, &headers, None) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match id.as_str() {
        "boom" => return (StatusCode::SERVICE_UNAVAILABLE, "try later").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return StatusCode::OK.into_response();
        }
        _ => {}
    }
    let removed = state.inner.lock().unwrap().files.remove(&(tenant, id));
    if removed.is_some() {
        StatusCode::OK.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Token provider that always hands out the same value and counts
/// invalidations.
pub(crate) struct CountingTokens {
    value: String,
    invalidations: AtomicUsize,
    last_rejected: Mutex<Option<String>>,
}

impl CountingTokens {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            invalidations: AtomicUsize::new(0),
            last_rejected: Mutex::new(None),
        }
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn last_rejected(&self) -> Option<String> {
        self.last_rejected.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenProvider for CountingTokens {
    async fn token(&self) -> Result<AccessToken> {
        Ok(AccessToken::new(self.value.clone()))
    }

    async fn invalidate(&self, rejected: &AccessToken) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        *self.last_rejected.lock().unwrap() = Some(rejected.value.clone());
    }
}
