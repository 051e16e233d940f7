//! Common test utilities for integration tests
//!
//! Apps are built over the in-memory customer store, so these tests need no
//! database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use customer_identity_backend::{
    config::AppConfig,
    repositories::{CustomerStore, InMemoryCustomerStore},
    routes,
    state::AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "SecurePass123";

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<InMemoryCustomerStore>,
}

impl TestApp {
    /// Create a test application with default registration rules
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Registration may pick its own role (development setting)
    pub fn with_role_override() -> Self {
        let mut config = AppConfig::default();
        config.registration.allow_role_override = true;
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryCustomerStore::new());
        let state = AppState::new(store.clone() as Arc<dyn CustomerStore>, config);
        let app = routes::create_router(state.clone());

        Self { app, state, store }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };

        (status, json)
    }

    fn builder(method: &str, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Make a GET request
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = Self::builder("GET", path, token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &Value, token: Option<&str>) -> (StatusCode, Value) {
        let request = Self::builder("POST", path, token)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST a raw, possibly malformed, body
    pub async fn post_raw(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Self::builder("POST", path, None)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = Self::builder("PUT", path, token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register a customer and return the response
    pub async fn register(&self, email: &str, phone: &str, role: Option<&str>) -> (StatusCode, Value) {
        let mut body = registration_body(email, phone);
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.post("/api/v1/customers/register", &body, None).await
    }

    /// Log in and return the bearer token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/customers/login",
                &json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn register_and_login(&self, email: &str, phone: &str, role: Option<&str>) -> String {
        let (status, body) = self.register(email, phone, role).await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
        self.login(email).await
    }
}

pub fn registration_body(email: &str, phone: &str) -> Value {
    json!({
        "name": "Amit Kumar",
        "email": email,
        "password": PASSWORD,
        "phone": phone,
    })
}
