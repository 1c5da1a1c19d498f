//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::orchestrator::GatewayError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Orchestration failure.
    Gateway(GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Gateway(err) => gateway_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn gateway_error_to_response(err: GatewayError) -> (StatusCode, String) {
    match &err {
        GatewayError::Validation(_) | GatewayError::InvalidOrderId(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        GatewayError::OrderCreate(_) | GatewayError::Payment(_) | GatewayError::Lookup(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, ValidationError};

    use super::*;
    use crate::clients::CallError;

    #[test]
    fn maps_gateway_errors_to_status_codes() {
        let cases = [
            (
                GatewayError::Validation(ValidationError::MissingUserId),
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::InvalidOrderId("a/b".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::NotFound(OrderId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                GatewayError::Payment(CallError::unavailable("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
