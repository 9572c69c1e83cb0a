//! 小票 (已结账订单)

mod service;

pub use service::ReceiptService;
