use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use salon_checkout::CheckoutError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::NotFound(_) => AppError::NotFound(err.to_string()),
            CheckoutError::Validation(_) => AppError::BadRequest(err.to_string()),
            CheckoutError::ConfirmationInProgress(_) | CheckoutError::AlreadyProcessed { .. } => {
                AppError::Conflict(err.to_string())
            }
            // The backend's own message is what the client sees
            CheckoutError::Backend(inner) => AppError::BadGateway(inner.to_string()),
        }
    }
}
