/// Common test utilities for integration tests
///
/// Each `TestContext` owns a router over fresh in-memory repositories, so
/// tests need neither PostgreSQL nor any environment variables.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LoggingConfig};
use tasktrack_shared::auth::password::Argon2Hasher;
use tasktrack_shared::repository::Repositories;
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// A registered user and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Test context containing the router under test
pub struct TestContext {
    pub app: Router,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused/tasktrack".to_string(),
            max_connections: 1,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 1,
        },
        logging: LoggingConfig { json: false },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::from_parts(
            test_config(),
            Repositories::in_memory(),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1)),
            None,
        );

        Self {
            app: build_router(state),
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body for {}: {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn put(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `name` as `name@example.com` and logs in
    pub async fn user(&self, name: &str) -> TestUser {
        let email = format!("{}@example.com", name);
        let (status, body) = self
            .send(
                Method::POST,
                "/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "password",
                    "name": name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        let id = body["id"].as_i64().unwrap();

        let token = self.login(&email, "password").await;
        TestUser { id, email, token }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a task from a JSON body and returns the response body
    pub async fn create_task(&self, author: &TestUser, body: Value) -> Value {
        let (status, task) = self
            .send(Method::POST, "/api/tasks/", Some(&author.token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", task);
        task
    }
}
