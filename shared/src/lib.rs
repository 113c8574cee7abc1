//! Shared types for the storefront backend
//!
//! Common types used across the workspace: domain models, error codes,
//! response structures, and small utilities.

pub mod error;
pub mod models;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, ErrorCode};
pub use response::ApiResponse;
