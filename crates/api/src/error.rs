//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, PaymentError};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout flow error.
    Checkout(CheckoutError),
    /// Direct payment processor call failed.
    Payment(PaymentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(DomainError::ItemNotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::Validation(DomainError::InvalidStatusTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::InvalidTransition { .. } | CheckoutError::AccountExists(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::SessionNotFound(_)
        | CheckoutError::CartNotFound(_)
        | CheckoutError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Payment(_)
        | CheckoutError::PaymentNotConfirmed { .. }
        | CheckoutError::MissingPaymentIntent => (StatusCode::PAYMENT_REQUIRED, err.to_string()),
        _ if err.is_retryable() => {
            tracing::warn!(error = %err, "retryable checkout failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{err}. Please try again."),
            )
        }
        _ => {
            tracing::error!(error = %err, "checkout failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, String) {
    match &err {
        PaymentError::IntentNotFound(_) | PaymentError::MethodNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        PaymentError::InvalidAmount(_) | PaymentError::InvalidId(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        PaymentError::Api { message, .. } => {
            tracing::error!(error = %err, "payment processor error");
            (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
        _ => {
            tracing::error!(error = %err, "payment processor error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}
