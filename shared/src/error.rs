//! Unified error codes and the `AppError` type
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment/webhook errors
//! - 6xxx: Catalog/stock errors
//! - 9xxx: System errors

use axum::response::IntoResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::ApiResponse;

/// Unified error code enum
///
/// Represented as u16 for efficient serialization and cross-language
/// compatibility with the storefront and back-office frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status change is not a permitted successor
    InvalidTransition = 4002,
    /// Order is in a terminal state
    OrderTerminal = 4003,
    /// Checkout contained no purchasable lines
    EmptyOrder = 4004,

    // ==================== 5xxx: Payment / webhook ====================
    /// Webhook signature missing or invalid
    SignatureInvalid = 5001,
    /// Webhook payload could not be parsed
    MalformedEvent = 5002,
    /// Provider payment status is not in the mapping table
    UnknownPaymentStatus = 5003,
    /// Downstream notification failed after the core update committed
    NotifyFailed = 5004,

    // ==================== 6xxx: Catalog / stock ====================
    /// SKU not found or inactive
    SkuNotFound = 6001,
    /// No active SKU matches the requested variant attributes
    VariantNotSellable = 6002,
    /// Not enough available stock to reserve
    OutOfStock = 6003,
    /// Warehouse not found
    WarehouseNotFound = 6004,
    /// Product not found
    ProductNotFound = 6005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Invalid request",
            Self::OrderNotFound => "Order not found",
            Self::InvalidTransition => "Status change not permitted",
            Self::OrderTerminal => "Order is already in a terminal state",
            Self::EmptyOrder => "Checkout contains no lines",
            Self::SignatureInvalid => "Webhook signature invalid",
            Self::MalformedEvent => "Webhook payload malformed",
            Self::UnknownPaymentStatus => "Unknown payment status",
            Self::NotifyFailed => "Downstream notification failed",
            Self::SkuNotFound => "SKU not found",
            Self::VariantNotSellable => "No active SKU matches this configuration",
            Self::OutOfStock => "Insufficient stock",
            Self::WarehouseNotFound => "Warehouse not found",
            Self::ProductNotFound => "Product not found",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::SkuNotFound
            | Self::ProductNotFound
            | Self::WarehouseNotFound => StatusCode::NOT_FOUND,

            // 401 Unauthorized
            Self::SignatureInvalid => StatusCode::UNAUTHORIZED,

            // 409 Conflict
            Self::InvalidTransition | Self::OrderTerminal => StatusCode::CONFLICT,

            // 422 Unprocessable (business rule, caller can surface per-line)
            Self::OutOfStock | Self::VariantNotSellable => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Bad Gateway (core committed, downstream failed)
            Self::NotifyFailed => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation/malformed input)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(v: u16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            5 => Ok(Self::InvalidRequest),
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::InvalidTransition),
            4003 => Ok(Self::OrderTerminal),
            4004 => Ok(Self::EmptyOrder),
            5001 => Ok(Self::SignatureInvalid),
            5002 => Ok(Self::MalformedEvent),
            5003 => Ok(Self::UnknownPaymentStatus),
            5004 => Ok(Self::NotifyFailed),
            6001 => Ok(Self::SkuNotFound),
            6002 => Ok(Self::VariantNotSellable),
            6003 => Ok(Self::OutOfStock),
            6004 => Ok(Self::WarehouseNotFound),
            6005 => Ok(Self::ProductNotFound),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ConfigError),
            _ => Err(format!("unknown error code: {v}")),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

/// Application error with structured error code
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        let body = ApiResponse::<()>::error(self.code, self.message);
        (status, axum::Json(body)).into_response()
    }
}
