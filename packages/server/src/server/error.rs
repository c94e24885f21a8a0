//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::common::RecipeError;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    Unauthenticated,
    Recipe(RecipeError),
}

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        Self::Recipe(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            ApiError::Recipe(err) => match err {
                RecipeError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
                RecipeError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                RecipeError::Unauthorized(msg) => (StatusCode::FORBIDDEN, msg.clone()),
                RecipeError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                RecipeError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Recipe(RecipeError::Store(err)) = &self {
            error!(error = ?err, "Store operation failed");
        }

        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (RecipeError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (RecipeError::not_found("x"), StatusCode::NOT_FOUND),
            (RecipeError::unauthorized("x"), StatusCode::FORBIDDEN),
            (RecipeError::conflict("x"), StatusCode::CONFLICT),
            (
                RecipeError::Store(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn store_errors_hide_internals() {
        let err = ApiError::from(RecipeError::Store(anyhow::anyhow!("password=hunter2")));
        let (_, message) = err.status_and_message();
        assert_eq!(message, "Internal server error");
    }
}
