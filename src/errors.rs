use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// When set, 500-class responses carry the underlying error text in `details`.
static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

/// Toggle diagnostic details on error responses. Called once at startup from the
/// configured environment.
pub fn expose_error_details(enabled: bool) {
    EXPOSE_ERROR_DETAILS.store(enabled, Ordering::Relaxed);
}

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub success: bool,
    /// Human-readable error description
    pub message: String,
    /// Diagnostic text, only populated in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid coupon: {0}")]
    InvalidCoupon(String),

    #[error("Coupon expired or exhausted: {0}")]
    CouponExpiredOrExhausted(String),

    #[error("Coupon not eligible: {0}")]
    CouponNotEligible(String),

    #[error("Invalid gift card: {0}")]
    InvalidGiftCard(String),

    #[error("Gift card exhausted or expired: {0}")]
    GiftCardExhaustedOrExpired(String),

    #[error("Gift card not eligible: {0}")]
    GiftCardNotEligible(String),

    #[error("Product or variation not found: {0}")]
    ProductOrVariationNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status value: {0}")]
    InvalidStatusValue(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        ServiceError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::InvalidInput(rejection.body_text())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::ValidationError(_)
            | Self::InvalidCoupon(_)
            | Self::CouponExpiredOrExhausted(_)
            | Self::CouponNotEligible(_)
            | Self::InvalidGiftCard(_)
            | Self::GiftCardExhaustedOrExpired(_)
            | Self::GiftCardNotEligible(_)
            | Self::InvalidStatusValue(_) => StatusCode::BAD_REQUEST,
            Self::ProductOrVariationNotFound(_) | Self::OrderNotFound(_) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = if self.is_internal() && EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed) {
            Some(self.to_string())
        } else {
            None
        };

        let err = ErrorResponse {
            error: true,
            success: false,
            message: self.response_message(),
            details,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
