use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use trellis::auth::{ShareTokenSigner, TokenGenerator};
use trellis::config::ServerConfig;
use trellis::server::{AppState, create_router};
use trellis::store::{SqliteStore, Store};
use trellis::types::Token;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn max_permission(&self) -> Option<i64> {
        self.headers
            .get("x-max-permission")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

/// The full router running in-process over a temp data directory.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub state: Arc<AppState>,
    pub admin_token: String,
    router: Router,
}

impl TestServer {
    pub fn start() -> Self {
        Self::start_with_ttl(3600)
    }

    pub fn start_with_ttl(share_token_ttl_secs: i64) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            share_token_ttl_secs,
            public_base_url: Some("https://tasks.example.com".to_string()),
            ..Default::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize schema");

        let admin_token = issue_token(&store, true, None);
        let signer = ShareTokenSigner::from_hex(
            &ShareTokenSigner::generate_secret(),
            config.share_token_ttl_secs,
        )
        .expect("build signer");

        let state = Arc::new(AppState::new(Arc::new(store), config, Arc::new(signer)));
        let router = create_router(state.clone());

        Self {
            temp_dir,
            state,
            admin_token,
            router,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Creates a user through the admin API and returns (id, api token).
    pub async fn create_user(&self, username: &str) -> (i64, String) {
        let resp = self
            .request(
                Method::POST,
                "/api/v1/admin/users",
                Some(&self.admin_token),
                Some(serde_json::json!({ "username": username })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        let id = resp.body["data"]["id"].as_i64().expect("user id");

        let resp = self
            .request(
                Method::POST,
                &format!("/api/v1/admin/users/{id}/tokens"),
                Some(&self.admin_token),
                Some(serde_json::json!({})),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        let token = resp.body["data"]["token"]
            .as_str()
            .expect("token")
            .to_string();

        (id, token)
    }

    pub async fn create_project(&self, token: &str, title: &str, parent: Option<i64>) -> i64 {
        let resp = self
            .request(
                Method::POST,
                "/api/v1/projects",
                Some(token),
                Some(serde_json::json!({ "title": title, "parent_project_id": parent })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.body["data"]["id"].as_i64().expect("project id")
    }
}

fn issue_token(store: &SqliteStore, is_admin: bool, user_id: Option<i64>) -> String {
    let (raw_token, lookup, hash) = TokenGenerator::new().generate().expect("generate token");
    let token = Token {
        id: Uuid::new_v4().to_string(),
        token_hash: hash,
        token_lookup: lookup,
        is_admin,
        user_id,
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    store
        .read(|db| db.create_token(&token))
        .expect("store token");
    raw_token
}
