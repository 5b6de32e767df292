use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error occurred"
            }
            AppError::Auth(ref message) => message.as_str(),
            AppError::Validation(ref message) => message.as_str(),
            AppError::NotFound(ref message) => message.as_str(),
            AppError::Conflict(ref message) => message.as_str(),
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_maps_to_bad_request() {
        assert_eq!(AppError::Conflict("Email already registered".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_details_are_masked() {
        let response = AppError::Internal("pool exhausted at 10.0.0.4".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        assert_eq!(AppError::Auth("Invalid credentials".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Profile not found".into()).status(), StatusCode::NOT_FOUND);
    }
}
