//! In-process identity provider used by the tests.

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
    routing::post,
};
use mft_types::Credentials;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Clone)]
struct StubState {
    hits: Arc<AtomicUsize>,
    body: Value,
    /// Answer `token-1`, `token-2`, ... instead of `body`.
    rotate: bool,
}

pub(crate) struct TokenStub {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl TokenStub {
    /// Accepts `MyClientId` / `MyClientSecret` and answers `abc123`.
    pub async fn spawn() -> Self {
        Self::spawn_with_body(json!({"access_token": "abc123", "expires_in": 3600})).await
    }

    pub async fn spawn_with_body(body: Value) -> Self {
        Self::start(body, false).await
    }

    /// Every exchange hands out a new token value.
    pub async fn spawn_rotating() -> Self {
        Self::start(Value::Null, true).await
    }

    async fn start(body: Value, rotate: bool) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = StubState {
            hits: Arc::clone(&hits),
            body,
            rotate,
        };
        let app = Router::new()
            .route("/token", post(token))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Self {
            url: format!("http://{addr}/token"),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn token(
    State(state): State<StubState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    // Slow enough for concurrent callers to pile up behind one exchange.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let field = |k: &str| form.get(k).map(String::as_str);
    let cache_ok = headers
        .get(CACHE_CONTROL)
        .is_some_and(|v| v.as_bytes() == b"no-cache");
    if cache_ok
        && field("grant_type") == Some("client_credentials")
        && field("client_id") == Some("MyClientId")
        && field("client_secret") == Some("MyClientSecret")
    {
        if state.rotate {
            Json(json!({"access_token": format!("token-{hit}"), "expires_in": 3600})).into_response()
        } else {
            Json(state.body).into_response()
        }
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response()
    }
}

pub(crate) fn credentials_for(url: &str, id: &str, secret: &str) -> Credentials {
    Credentials::new(id, secret, url).unwrap()
}
