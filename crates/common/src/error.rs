//! Error types for forkful.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Target id in a relation operation is not a well-formed identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The relation row already exists, or a unique field is taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Remove attempted on a relation that does not exist.
    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    /// Subscribing to oneself.
    #[error("Self-reference is not allowed")]
    SelfReference,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_)
            | Self::UserNotFound(_)
            | Self::RecipeNotFound(_)
            | Self::IngredientNotFound(_)
            | Self::TagNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidIdentifier(_)
            | Self::AlreadyExists(_)
            | Self::RelationNotFound(_)
            | Self::SelfReference
            | Self::BadRequest(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RecipeNotFound(_) => "RECIPE_NOT_FOUND",
            Self::IngredientNotFound(_) => "INGREDIENT_NOT_FOUND",
            Self::TagNotFound(_) => "TAG_NOT_FOUND",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::RelationNotFound(_) => "RELATION_NOT_FOUND",
            Self::SelfReference => "SELF_REFERENCE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_errors_are_client_errors() {
        assert_eq!(
            AppError::AlreadyExists("favorite".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RelationNotFound("favorite".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::SelfReference.status_code(), StatusCode::BAD_REQUEST);
        assert!(!AppError::SelfReference.is_server_error());
    }

    #[test]
    fn invalid_identifier_maps_uniformly_to_bad_request() {
        let err = AppError::InvalidIdentifier("not-an-id".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_IDENTIFIER");
    }

    #[test]
    fn database_errors_are_server_errors() {
        assert!(AppError::Database("connection reset".into()).is_server_error());
    }
}
