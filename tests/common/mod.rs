// Shared harness: the full router over an in-memory store and a stub
// token verifier, exercised in-process with `tower::ServiceExt::oneshot`.
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use harbor_api::auth::oauth::OAuthClient;
use harbor_api::auth::{TokenVerifier, VerifyOutcome};
use harbor_api::config::AppConfig;
use harbor_api::datastore::{Datastore, Key, Kind, MemoryStore};
use harbor_api::state::AppState;

/// Maps fixed test tokens to verification outcomes, no network involved.
///
///   token-u1, token-u2  registered subjects (seeded below)
///   token-new           verifies but the subject never signed up
///   token-bad           structurally a JWT, signature does not verify
///   token-garbage       not decodable as a JWT
///   token-outage        provider unreachable
pub struct StubVerifier;

#[async_trait]
impl TokenVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> VerifyOutcome {
        match token {
            "token-u1" => VerifyOutcome::Valid { sub: "u1".to_string() },
            "token-u2" => VerifyOutcome::Valid { sub: "u2".to_string() },
            "token-new" => VerifyOutcome::Valid { sub: "u-new".to_string() },
            "token-bad" => VerifyOutcome::Invalid,
            "token-outage" => VerifyOutcome::ProviderUnavailable,
            _ => VerifyOutcome::Malformed,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Builds the app with two registered users, u1 and u2.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(Kind::User, json!({"sub": "u1", "firstName": "Ada", "lastName": "Lovelace"}))
        .await
        .unwrap();
    store
        .insert(Kind::User, json!({"sub": "u2", "firstName": "Grace", "lastName": "Hopper"}))
        .await
        .unwrap();

    let config = AppConfig::from_env();
    let state = AppState {
        store: store.clone(),
        verifier: Arc::new(StubVerifier),
        oauth: Arc::new(OAuthClient::new(&config).unwrap()),
        config: Arc::new(config),
    };

    TestApp { router: harbor_api::app(state), store }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends and parses the body, returning `(status, json)`. An empty body
    /// parses as JSON null.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(build_request(method, path, token, body)).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Seeds a boat document directly in the store.
    pub async fn seed_boat(&self, name: &str, owner: &str) -> Key {
        self.store
            .insert(
                Kind::Boat,
                json!({"name": name, "type": "Sloop", "length": 30, "owner": owner, "loads": []}),
            )
            .await
            .unwrap()
    }

    /// Seeds an unassigned load document directly in the store.
    pub async fn seed_load(&self, content: &str) -> Key {
        self.store
            .insert(
                Kind::Load,
                json!({"volume": 5, "content": content, "creation_date": "2021-05-27", "carrier": null}),
            )
            .await
            .unwrap()
    }
}

pub fn build_request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, "api.test")
        .header(header::ACCEPT, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub fn error_message(body: &Value) -> &str {
    body["Error"].as_str().unwrap_or("")
}
