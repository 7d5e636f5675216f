//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use saga::{CounterError, SagaError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Local storage error.
    Store(StoreError),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => (store_status(&err), err.to_string()),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Store(store_err) => (store_status(store_err), err.to_string()),
        DomainError::NotOwner { .. } => (StatusCode::FORBIDDEN, err.to_string()),
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::Storage(store_err) => (store_status(store_err), err.to_string()),
        SagaError::Remote(CounterError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        SagaError::Remote(CounterError::ArticleNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
