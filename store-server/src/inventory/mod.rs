//! Stock ledger
//!
//! Owns the per-(SKU, warehouse) `available`/`reserved` counters and the
//! append-only movement log. All mutations are delegated to the store as
//! single atomic operations; this layer resolves the warehouse argument,
//! validates quantities and adds structured logging.
//!
//! Insufficient stock is a normal `false` return, not an error — callers
//! branch on it. A missing default warehouse is a configuration error and
//! is rejected loudly at startup, not here.

mod ledger;

pub use ledger::{LedgerError, StockLedger};
