use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Per-field validation messages, rendered as `{"field": ["msg", ..]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![msg.into()]);
        Self::Validation(errors)
    }

    pub fn not_authenticated() -> Self {
        Self::Unauthorized("Authentication credentials were not provided.".into())
    }

    pub fn permission_denied() -> Self {
        Self::Forbidden("You do not have permission to perform this action.".into())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not found.".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Repositories return anyhow; database constraint failures become client errors.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::RowNotFound) => Self::not_found(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Self::BadRequest(match db.constraint() {
                    Some(c) => format!("Duplicate value violates {c}."),
                    None => "Duplicate value.".into(),
                })
            }
            Some(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Self::BadRequest("Invalid reference: related object is missing or still in use.".into())
            }
            _ => Self::Internal(err),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::from(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => json!(errors),
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                json!({ "detail": "Internal server error." })
            }
            other => json!({ "detail": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(anyhow::Error::new(sqlx::Error::RowNotFound).context("load wing"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn field_error_is_bad_request_with_field_body() {
        let err = AppError::field("email", "Enter a valid email address.");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            AppError::Validation(map) => {
                assert_eq!(map["email"], vec!["Enter a valid email address.".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
