#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use blog_api::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{database::BlogStore, security::Claims, sqlite_database::SqliteDatabase},
    models::{group::NewGroup, Group, User},
};

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = SqliteDatabase::new_in_memory().await.unwrap();
        let state = AppState::with_store(Config::in_memory(SECRET), Arc::new(store));
        Self { state }
    }

    pub fn store(&self) -> &Arc<dyn BlogStore> {
        &self.state.store
    }

    pub async fn user(&self, username: &str) -> User {
        self.store().create_user(username).await.unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.store()
            .create_group(NewGroup::new(title, slug).description("test group"))
            .await
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "testserver");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = api::app(self.state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }
}

pub fn token_for(user: &User) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let claims = Claims {
        sub: user.id.to_string(),
        iat: now,
        exp: now + 3600,
        token_type: "access".to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}
