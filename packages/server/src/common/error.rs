use thiserror::Error;

/// Errors surfaced by every store and moderation operation.
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Malformed or missing content, detected before any write.
    #[error("Invalid recipe: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not the owner, or not an admin for an admin-only operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The underlying store failed. Callers may retry.
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type RecipeResult<T> = std::result::Result<T, RecipeError>;

impl RecipeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for RecipeError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Store(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_a_store_error() {
        let err: RecipeError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RecipeError::Store(_)));
    }

    #[test]
    fn messages_carry_context() {
        let err = RecipeError::not_found("submission abc");
        assert_eq!(err.to_string(), "Not found: submission abc");
    }
}
