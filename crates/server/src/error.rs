//! HTTP error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ccbank_business::{BusinessError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Business(#[from] BusinessError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, message) = match &rejection {
            JsonRejection::JsonDataError(err) => rejected_field(&err.body_text()),
            JsonRejection::JsonSyntaxError(_) => ("body".to_string(), "malformed JSON".to_string()),
            JsonRejection::MissingJsonContentType(_) => (
                "body".to_string(),
                "expected Content-Type: application/json".to_string(),
            ),
            _ => ("body".to_string(), rejection.body_text()),
        };
        tracing::debug!(field = %field, error = %rejection, "request body rejected");
        ApiError::Business(BusinessError::validation(&field, message))
    }
}

/// Field path and reason from a deserialization failure, e.g.
/// `"...target type: amount: invalid value"` -> `("amount", "invalid value")`
fn rejected_field(body_text: &str) -> (String, String) {
    let detail = body_text
        .split_once("target type: ")
        .map_or(body_text, |(_, detail)| detail);

    if let Some(rest) = detail.strip_prefix("missing field `") {
        if let Some((name, _)) = rest.split_once('`') {
            return (name.to_string(), "is required".to_string());
        }
    }
    match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(' ') => {
            (path.to_string(), reason.to_string())
        }
        _ => ("body".to_string(), detail.to_string()),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Validation | ErrorKind::InsufficientFunds => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidCredential => StatusCode::UNAUTHORIZED,
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Business(err) = self;
        let kind = err.kind();
        let status = status_for(kind);

        let message = if kind == ErrorKind::Unexpected {
            tracing::error!(error = %err, "request failed");
            "Server error. Please try again later.".to_string()
        } else {
            err.to_string()
        };

        let body = Json(ErrorBody {
            code: kind.as_str(),
            message,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::InsufficientFunds), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidCredential), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_rejected_field() {
        let (field, reason) = rejected_field(
            "Failed to deserialize the JSON body into the target type: amount: invalid value: string \"abc\"",
        );
        assert_eq!(field, "amount");
        assert!(reason.starts_with("invalid value"));

        let (field, reason) = rejected_field(
            "Failed to deserialize the JSON body into the target type: missing field `accountNumber` at line 1 column 2",
        );
        assert_eq!(field, "accountNumber");
        assert_eq!(reason, "is required");

        let (field, _) = rejected_field("Failed to deserialize the JSON body into the target type: invalid type: null");
        assert_eq!(field, "body");
    }

    #[test]
    fn test_unexpected_hides_detail() {
        let response = ApiError::from(BusinessError::Mail("smtp down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::from(BusinessError::insufficient_balance(
            Decimal::ONE,
            Decimal::ZERO,
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
