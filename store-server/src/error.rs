//! Error bridging between the domain layers and the API layer
//!
//! Domain errors stay typed (`StoreError`, `LedgerError`, ...) inside the
//! services; at the API boundary they convert into `AppError` so handlers
//! can use `?` without per-call `map_err` boilerplate. Infrastructure
//! errors are logged here and flattened to opaque 5xx codes; business
//! errors pass through with their specific code.

use shared::error::{AppError, ErrorCode};

use crate::catalog::CatalogError;
use crate::db::StoreError;
use crate::inventory::LedgerError;
use crate::orders::{CheckoutError, TransitionError};

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(ref err) => {
                tracing::error!(error = %err, "database error");
                AppError::new(ErrorCode::DatabaseError)
            }
            StoreError::Serialization(ref err) => {
                tracing::error!(error = %err, "serialization error");
                AppError::new(ErrorCode::InternalError)
            }
            StoreError::Integrity(ref msg) => {
                tracing::error!(error = %msg, "data integrity error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidQuantity | LedgerError::SameWarehouse => {
                AppError::validation(e.to_string())
            }
            LedgerError::Store(e) => e.into(),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("product {id} not found"),
            ),
            CatalogError::InvalidPrice => AppError::validation(e.to_string()),
            CatalogError::Store(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Empty => AppError::new(ErrorCode::EmptyOrder),
            CheckoutError::InvalidQuantity(_) => AppError::validation(e.to_string()),
            CheckoutError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("product {id} not found"),
            ),
            CheckoutError::NotSellable(_) => {
                AppError::with_message(ErrorCode::VariantNotSellable, e.to_string())
            }
            CheckoutError::OutOfStock { .. } => {
                AppError::with_message(ErrorCode::OutOfStock, e.to_string())
            }
            CheckoutError::Ledger(e) => e.into(),
            CheckoutError::Store(e) => e.into(),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::OrderNotFound(id) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("order {id} not found"),
            ),
            TransitionError::NotPermitted { .. } | TransitionError::Conflict(_) => {
                AppError::with_message(ErrorCode::InvalidTransition, e.to_string())
            }
            TransitionError::Deduct { .. } => {
                tracing::error!(error = %e, "transition aborted by stock failure");
                AppError::new(ErrorCode::InternalError)
            }
            TransitionError::Store(e) => e.into(),
        }
    }
}
