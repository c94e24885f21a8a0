use crate::common::UserId;
use crate::domains::auth::JwtService;
use crate::server::error::ApiError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// JWT authentication middleware
///
/// Extracts JWT token from the Authorization header (or the `token` query
/// parameter, since EventSource cannot send headers), verifies it, and adds
/// AuthUser to request extensions. If no token or invalid token, request
/// continues without AuthUser; handlers that need one reject with 401.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(user) = extract_auth_user(&request, &jwt_service) {
        debug!(user_id = %user.user_id, "Authenticated user");
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let token = bearer_token(request).or_else(|| query_token(request))?;
    let claims = jwt_service.verify_token(&token).ok()?;

    Some(AuthUser {
        user_id: claims.user_id(),
        email: claims.email,
    })
}

fn bearer_token(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    let auth_str = request.headers().get("authorization")?.to_str().ok()?;
    // Handle both "Bearer <token>" and raw token
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).to_string())
}

fn query_token(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    request.uri().query()?.split('&').find_map(|pair| {
        pair.strip_prefix("token=")
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Handlers take `AuthUser` to require authentication.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
