//! 草稿订单

mod aggregator;

pub use aggregator::{AddOutcome, OrderAggregator, subtotal};
