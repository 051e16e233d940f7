//! Application error handling
//!
//! This module provides unified error handling for the API, converting
//! internal errors to structured HTTP responses of the form
//! `{timestamp, status, error, message, path}`.
//!
//! `ApiError` renders everything except the path; [`error_path_middleware`]
//! sees the request URI and fills it in.

use crate::repositories::StoreError;
use axum::{
    extract::Request,
    http::{header::CONTENT_LENGTH, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use customer_identity_shared::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Duplicate subject: {0}")]
    DuplicateSubject(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::DuplicateSubject(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "RESOURCE_NOT_FOUND",
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::DuplicateSubject(_) => "USER_ALREADY_EXISTS",
            ApiError::Internal(_) | ApiError::Database(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::DuplicateSubject(msg) => msg.clone(),
            ApiError::InvalidCredentials => "Incorrect email or password.".to_string(),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "An unexpected error occurred".to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => ApiError::DuplicateSubject(msg),
            StoreError::Database(err) => ApiError::Database(err),
            StoreError::Other(err) => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: self.code().to_string(),
            message: self.public_message(),
            path: None,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Re-render error bodies with the path of the request that produced them
pub async fn error_path_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorResponse>() {
        Some(mut body) => {
            body.path = Some(path);
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(CONTENT_LENGTH);
            (parts, Json(body)).into_response()
        }
        None => response,
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
