//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (table name, receipt number, failed step, ...)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Table-scoped error carrying the table name as a detail
    pub fn table(code: ErrorCode, name: &str, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg).with_detail("table", name)
    }

    /// Checkout that stopped part way; the receipt number and step let staff reconcile by hand
    pub fn checkout_incomplete(receipt_number: &str, step: &str, msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::CheckoutIncomplete, msg)
            .with_detail("receipt_number", receipt_number)
            .with_detail("step", step)
    }
}

/// Unified API response structure
///
/// - `code`: Error code (0 for success)
/// - `message`: Human-readable message
/// - `data`: Response payload (on success)
/// - `details`: Additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (0 for success, non-zero for errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Human-readable message
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ApiResponse<()> {
    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::<()>::error(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System)
            || self.code == ErrorCode::CheckoutIncomplete
        {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                details = ?self.details,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::TableNotFound);
        assert_eq!(err.code, ErrorCode::TableNotFound);
        assert_eq!(err.message, "Table not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::with_message(ErrorCode::CheckoutIncomplete, "payment write failed")
            .with_detail("receipt_number", "A1-20250310230000000")
            .with_detail("step", "payment");

        let details = err.details.unwrap();
        assert_eq!(details.get("receipt_number").unwrap(), "A1-20250310230000000");
        assert_eq!(details.get("step").unwrap(), "payment");
    }

    #[test]
    fn test_table_and_checkout_constructors() {
        let err = AppError::table(ErrorCode::TableOccupied, "A3", "Table A3 is occupied");
        assert_eq!(err.code, ErrorCode::TableOccupied);
        assert_eq!(err.details.unwrap().get("table").unwrap(), "A3");

        let err = AppError::checkout_incomplete("A1-20250310230000000", "lines", "disk full");
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details.unwrap().len(), 2);

        assert_eq!(AppError::validation("x").code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_api_response_from_error() {
        let err = AppError::new(ErrorCode::TableOccupied);
        let response: ApiResponse<String> = err.into();
        assert_eq!(response.code, Some(7002));
        assert_eq!(response.message, "Table is occupied");
        assert!(response.data.is_none());
    }

    #[test]
    fn test_error_envelope_serialize() {
        let err = AppError::with_message(ErrorCode::PaymentInsufficientAmount, "short by 600")
            .with_detail("shortfall", 600);
        let json = serde_json::to_value(ApiResponse::<()>::error(&err)).unwrap();
        assert_eq!(json["code"], 5002);
        assert_eq!(json["message"], "short by 600");
        assert_eq!(json["details"]["shortfall"], 600);
        assert!(json.get("data").is_none());
    }
}
