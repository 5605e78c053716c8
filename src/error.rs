use crate::api::schemas::error::ErrorBody;
use crate::domain::validation::FieldError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Authentication failed")]
    AuthError,
    #[error("Not found")]
    NotFound,
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::Conflict(message.to_string()),
            _ => Self::Database(err),
        }
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), Vec::new())
            }
            Self::AuthError => {
                tracing::debug!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), Vec::new())
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string(), Vec::new())
            }
            Self::Validation(fields) => {
                tracing::debug!(count = fields.len(), "Validation failed");
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), fields)
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, msg, Vec::new())
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), Vec::new())
            }
        };

        (status, Json(ErrorBody { error: message, fields })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let (status, body) = body_of(AppError::Validation(vec![FieldError::new("email", "bad")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.fields, vec![FieldError::new("email", "bad")]);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(body_of(AppError::AuthError).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(AppError::NotFound).await.0, StatusCode::NOT_FOUND);
        assert_eq!(body_of(AppError::Internal).await.0, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = body_of(AppError::Conflict("Email already registered".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "Email already registered");
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_non_unique_database_error_is_not_conflict() {
        let err = AppError::from_unique_violation(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, AppError::Database(_)));
    }
}
