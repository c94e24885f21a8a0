//! HTTP client that drives the router in-process.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use recipes_core::common::UserId;
use recipes_core::domains::auth::JwtService;
use recipes_core::kernel::TestDependencies;
use recipes_core::server::{build_app, AppState};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_JWT_ISSUER: &str = "recipe-finder-tests";

pub struct ApiClient {
    router: Router,
    jwt_service: Arc<JwtService>,
}

/// Response status plus the parsed JSON body (`Null` when empty).
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiClient {
    /// Router over in-memory stores.
    pub fn in_memory(test_deps: &TestDependencies) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            TEST_JWT_SECRET,
            TEST_JWT_ISSUER.to_string(),
        ));
        let state = AppState::new(test_deps.server_deps(), jwt_service.clone(), None);

        Self {
            router: build_app(state, &[]),
            jwt_service,
        }
    }

    pub fn token_for(&self, user_id: &UserId, email: Option<&str>) -> String {
        self.jwt_service
            .create_token(user_id, email)
            .expect("Failed to sign test token")
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        ApiResponse { status, body }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> ApiResponse {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> ApiResponse {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> ApiResponse {
        self.send(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> ApiResponse {
        self.send(Method::DELETE, path, token, None).await
    }
}
