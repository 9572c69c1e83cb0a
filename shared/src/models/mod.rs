//! Data models
//!
//! Shared between floor-server and its front-ends (via API).
//! Amounts are integer yen (`i64`); rates are `rust_decimal::Decimal` percentages.

pub mod order;
pub mod receipt;
pub mod settings;
pub mod table;

// Re-exports
pub use order::*;
pub use receipt::*;
pub use settings::*;
pub use table::*;
