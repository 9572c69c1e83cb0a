//! Shared types for the floor engine
//!
//! Data model (tables, draft order lines, receipts, payments, venue settings)
//! and the unified error system used by the server and its HTTP clients.

pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    FinalizedOrder, FinalizedOrderLine, Occupancy, OrderLine, Payment, PaymentInput, Position,
    ReceiptDetail, RoundingMethod, Size, StoreId, StoreSettings, Table, TableStatus,
};
