//! End-to-end tests for the produtos API, driven through the router with an
//! in-process store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use produtos_api::app::{self, AppState};
use produtos_api::config::AuthConfig;
use produtos_api::models::{NewProduct, Product};
use produtos_api::services::accounts;
use produtos_api::store::{MemoryStore, ProductStore};
use produtos_api::{AppError, Result};
use produtos_api::utils::jwt::{TokenIssuer, TokenType};

const USERNAME: &str = "usuarioTeste";
const PASSWORD: &str = "teste12345";

struct TestApp {
    router: Router,
    tokens: TokenIssuer,
    user_id: i64,
}

impl TestApp {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let user = accounts::ensure_user(store.as_ref(), USERNAME, PASSWORD, 4)
            .await
            .unwrap();
        let tokens = test_issuer();
        let state = AppState::with_store(store, tokens.clone());

        Self {
            router: app::router(state),
            tokens,
            user_id: user.id,
        }
    }

    fn access_token(&self) -> String {
        self.tokens.issue(self.user_id, TokenType::Access).unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, token: &str, body: Value) -> Value {
        let (status, created) = self.send("POST", "/produtos/", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        created
    }
}

fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        access_token_ttl_secs: 300,
        refresh_token_ttl_secs: 3600,
    })
    .unwrap()
}

fn notebook() -> Value {
    json!({
        "nome": "Notebook",
        "preco": 500.0,
        "estoque": 10,
        "descricao": "Notebook Samsung"
    })
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn test_health_probes() {
    let app = TestApp::new().await;

    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.send("GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

/// Product store whose backing database cannot be reached.
struct UnreachableStore;

fn connection_refused() -> AppError {
    AppError::InternalError("connection refused".to_string())
}

#[async_trait]
impl ProductStore for UnreachableStore {
    async fn get(&self, _id: i64) -> Result<Option<Product>> {
        Err(connection_refused())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        Err(connection_refused())
    }

    async fn create(&self, _product: NewProduct) -> Result<Product> {
        Err(connection_refused())
    }

    async fn update(&self, _id: i64, _product: NewProduct) -> Result<Option<Product>> {
        Err(connection_refused())
    }

    async fn delete(&self, _id: i64) -> Result<bool> {
        Err(connection_refused())
    }

    async fn ping(&self) -> Result<()> {
        Err(connection_refused())
    }
}

#[tokio::test]
async fn test_readiness_reports_unreachable_store() {
    let state = AppState {
        products: Arc::new(UnreachableStore),
        users: Arc::new(MemoryStore::new()),
        tokens: Arc::new(test_issuer()),
    };
    let response = app::router(state)
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "unavailable", "database": "unreachable" }));
}

// -- Auth gate ----------------------------------------------------------------

#[tokio::test]
async fn test_anonymous_can_list() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/produtos/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_anonymous_cannot_write() {
    let app = TestApp::new().await;
    let token = app.access_token();
    let created = app.create(&token, notebook()).await;
    let item = format!("/produtos/{}/", created["id"]);

    let (status, body) = app.send("POST", "/produtos/", None, Some(notebook())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication credentials were not provided.");

    let (status, _) = app.send("PUT", &item, None, Some(notebook())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("DELETE", &item, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("GET", &item, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_bearer_rejected_even_on_reads() {
    let app = TestApp::new().await;
    let (status, _) = app.send("GET", "/produtos/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer() {
    let app = TestApp::new().await;
    let refresh = app.tokens.issue(app.user_id, TokenType::Refresh).unwrap();
    let (status, _) = app
        .send("POST", "/produtos/", Some(&refresh), Some(notebook()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_user_rejected() {
    let app = TestApp::new().await;
    let token = app.tokens.issue(999, TokenType::Access).unwrap();
    let (status, _) = app
        .send("POST", "/produtos/", Some(&token), Some(notebook()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_auth_schemes_are_ignored() {
    let app = TestApp::new().await;
    let basic = |method: &str| {
        Request::builder()
            .method(method)
            .uri("/produtos/")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .header("content-type", "application/json")
            .body(Body::from(notebook().to_string()))
            .unwrap()
    };

    let response = app.router.clone().oneshot(basic("GET")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.clone().oneshot(basic("POST")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_ascii_foreign_scheme_is_ignored() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/produtos/")
        .header(
            "authorization",
            HeaderValue::from_bytes(b"Basic \xe9t\xe9").unwrap(),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_ascii_bearer_is_rejected() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/produtos/")
        .header(
            "authorization",
            HeaderValue::from_bytes(b"Bearer \xe9t\xe9").unwrap(),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Product lifecycle --------------------------------------------------------

#[tokio::test]
async fn test_notebook_lifecycle() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let created = app.create(&token, notebook()).await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["nome"], "Notebook");
    assert_eq!(created["preco"], 500.0);
    assert_eq!(created["estoque"], 10);
    assert_eq!(created["descricao"], "Notebook Samsung");

    let (status, body) = app.send("GET", "/produtos/1/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nome"], "Notebook");

    let update = json!({
        "nome": "Notebook Atualizado",
        "preco": 5500.0,
        "estoque": 8,
        "descricao": "Notebook samsung"
    });
    let (status, body) = app
        .send("PUT", "/produtos/1/", Some(&token), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["nome"], "Notebook Atualizado");

    let (_, body) = app.send("GET", "/produtos/1/", None, None).await;
    assert_eq!(body["nome"], "Notebook Atualizado");
    assert_eq!(body["preco"], 5500.0);
    assert_eq!(body["estoque"], 8);

    let (status, body) = app.send("DELETE", "/produtos/1/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.send("GET", "/produtos/1/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ids_unique_and_resolvable() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let mut ids = Vec::new();
    for i in 0..5 {
        let created = app
            .create(&token, json!({"nome": format!("P{i}"), "preco": i, "estoque": i}))
            .await;
        ids.push(created["id"].as_i64().unwrap());
    }

    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    for (i, id) in ids.iter().enumerate() {
        let (status, body) = app.send("GET", &format!("/produtos/{id}/"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nome"], format!("P{i}"));
    }
}

#[tokio::test]
async fn test_list_counts_creates_minus_deletes() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(app.create(&token, notebook()).await["id"].as_i64().unwrap());
    }
    for id in &ids[..3] {
        let (status, _) = app
            .send("DELETE", &format!("/produtos/{id}/"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, body) = app.send("GET", "/produtos/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], ids[3]);

    // deleted ids are not handed out again
    let next = app.create(&token, notebook()).await;
    assert_eq!(next["id"], 5);
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let app = TestApp::new().await;
    let token = app.access_token();
    app.create(&token, notebook()).await;

    let update = json!({"nome": "Mesa", "preco": "120.50", "estoque": 2});
    let (_, first) = app
        .send("PUT", "/produtos/1/", Some(&token), Some(update.clone()))
        .await;
    let (_, second) = app
        .send("PUT", "/produtos/1/", Some(&token), Some(update))
        .await;
    assert_eq!(first, second);

    let (_, stored) = app.send("GET", "/produtos/1/", None, None).await;
    assert_eq!(stored, second);
    assert_eq!(stored["preco"], 120.5);
    assert_eq!(stored["descricao"], "");
}

#[tokio::test]
async fn test_update_requires_every_field() {
    let app = TestApp::new().await;
    let token = app.access_token();
    app.create(&token, notebook()).await;

    let (status, body) = app
        .send("PUT", "/produtos/1/", Some(&token), Some(json!({"nome": "Só nome"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["preco"][0], "This field is required.");
    assert_eq!(body["errors"]["estoque"][0], "This field is required.");

    let (_, stored) = app.send("GET", "/produtos/1/", None, None).await;
    assert_eq!(stored["nome"], "Notebook");
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let (status, body) = app.send("GET", "/produtos/42/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found.");

    let (status, _) = app
        .send("PUT", "/produtos/42/", Some(&token), Some(notebook()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", "/produtos/42/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/produtos/abc/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Validation ---------------------------------------------------------------

#[tokio::test]
async fn test_create_reports_field_errors() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let (status, body) = app
        .send(
            "POST",
            "/produtos/",
            Some(&token),
            Some(json!({"nome": "", "preco": "caro"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["nome"][0], "This field may not be blank.");
    assert_eq!(body["errors"]["preco"][0], "A valid number is required.");
    assert_eq!(body["errors"]["estoque"][0], "This field is required.");

    let (_, list) = app.send("GET", "/produtos/", None, None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.access_token();

    let request = Request::builder()
        .method("POST")
        .uri("/produtos/")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from("{\"nome\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Token issuance -----------------------------------------------------------

#[tokio::test]
async fn test_obtain_token_pair() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            "POST",
            "/token/",
            None,
            Some(json!({"username": USERNAME, "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap();
    assert!(body["refresh"].is_string());

    let (status, _) = app
        .send("POST", "/produtos/", Some(access), Some(notebook()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_obtain_token_bad_credentials() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            "POST",
            "/token/",
            None,
            Some(json!({"username": USERNAME, "password": "errada"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "No active account found with the given credentials"
    );

    let (status, _) = app
        .send(
            "POST",
            "/token/",
            None,
            Some(json!({"username": "ninguem", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_obtain_token_missing_fields() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send("POST", "/token/", None, Some(json!({"username": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"][0], "This field may not be blank.");
    assert_eq!(body["errors"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let app = TestApp::new().await;
    let (_, pair) = app
        .send(
            "POST",
            "/token/",
            None,
            Some(json!({"username": USERNAME, "password": PASSWORD})),
        )
        .await;

    let (status, body) = app
        .send(
            "POST",
            "/token/refresh/",
            None,
            Some(json!({"refresh": pair["refresh"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap();

    let (status, _) = app
        .send("POST", "/produtos/", Some(access), Some(notebook()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(
            "POST",
            "/token/refresh/",
            None,
            Some(json!({"refresh": pair["access"]})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
