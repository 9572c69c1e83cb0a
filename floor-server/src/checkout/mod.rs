//! 结账 - 金额计算与小票持久化

mod money;
mod service;

pub use money::{
    Breakdown, CheckoutInput, CheckoutQuote, card_fee, change_amount, compute_breakdown, quote,
    receipt_number, round_to_unit, service_charge, unit_price_excl_tax,
};
pub use service::{CheckoutRequest, CheckoutService};
