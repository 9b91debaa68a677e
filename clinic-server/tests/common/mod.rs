#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use clinic_server::auth::{Claims, JwtConfig};
use clinic_server::db::DbService;
use clinic_server::db::repository::user;
use clinic_server::routes::build_app;
use clinic_server::{Config, ServerState};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use shared::models::{LegacyRole, UserCreate};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const ISSUER: &str = "clinic-identity";
pub const AUDIENCE: &str = "clinic-server";

/// Server state over a fresh SQLite file; the temp dir lives as long as this
pub struct TestApp {
    pub state: ServerState,
    pub app: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().to_string_lossy().to_string();
        let mut config = Config::with_overrides(
            work_dir.clone(),
            0,
            JwtConfig::new(SECRET, ISSUER, AUDIENCE),
        );
        config.route_root = format!("{work_dir}/app");

        let db = DbService::new(&config.database_path).await.unwrap();
        let state = ServerState::with_db(config, db);
        let app = build_app(&state).with_state(state.clone());
        Self { state, app, dir }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.state.pool()
    }

    /// Insert a user and return it with a bearer token for it
    pub async fn user(&self, username: &str, role: LegacyRole, role_ids: Vec<i64>) -> (i64, String) {
        let u = user::create(
            self.pool(),
            UserCreate {
                username: username.into(),
                display_name: None,
                role,
                role_ids,
            },
        )
        .await
        .unwrap();
        let token = token_for(&u.id.to_string(), username, role);
        (u.id, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

/// Sign a token the way the identity service does
pub fn token_for(sub: &str, username: &str, role: LegacyRole) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.into(),
        username: username.into(),
        role: role.as_str().into(),
        exp: now + 3600,
        iat: now,
        iss: ISSUER.into(),
        aud: AUDIENCE.into(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}
