//! Receipt Models (finalized orders)

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Finalized order header. Immutable once written except for the
/// soft-delete marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOrder {
    /// `{table}-{YYYYMMDDHHMMSSmmm}`
    pub receipt_number: String,
    pub store_id: i64,
    pub table_name: String,
    pub visit_datetime: Option<NaiveDateTime>,
    pub checkout_datetime: NaiveDateTime,
    pub guest_name: String,
    /// Cast names joined with ", "
    pub staff_name: String,
    pub visit_type: Option<String>,
    pub subtotal_excl_tax: i64,
    pub tax_amount: i64,
    pub service_charge: i64,
    pub rounding_adjustment: i64,
    pub discount_amount: i64,
    pub total_incl_tax: i64,
    /// Business date, not calendar date
    pub order_date: NaiveDate,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,

    // -- Relations (stored separately, populated on read) --
    #[serde(default)]
    pub lines: Vec<FinalizedOrderLine>,
}

impl FinalizedOrder {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedOrderLine {
    pub category: Option<String>,
    pub product_name: String,
    #[serde(default)]
    pub cast_names: Vec<String>,
    /// Tax-inclusive
    pub unit_price: i64,
    pub unit_price_excl_tax: i64,
    pub quantity: u32,
    /// Tax-inclusive
    pub subtotal: i64,
}

/// Payment record, one per receipt
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payment {
    pub cash_amount: i64,
    pub card_amount: i64,
    pub other_amount: i64,
    pub other_method: Option<String>,
    pub card_fee: i64,
    pub change_amount: i64,
}

impl Payment {
    pub fn tendered(&self) -> i64 {
        self.cash_amount
            .saturating_add(self.card_amount)
            .saturating_add(self.other_amount)
    }
}

/// Tendered amounts entered at checkout
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub cash_amount: i64,
    #[serde(default)]
    pub card_amount: i64,
    #[serde(default)]
    pub other_amount: i64,
    pub other_method: Option<String>,
    /// Surcharge on the card portion, already computed by the terminal
    #[serde(default)]
    pub card_fee: i64,
}

impl PaymentInput {
    pub fn tendered(&self) -> i64 {
        self.cash_amount
            .saturating_add(self.card_amount)
            .saturating_add(self.other_amount)
    }
}

/// Receipt with its payment, as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub order: FinalizedOrder,
    pub payment: Option<Payment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_tendered() {
        let payment = Payment {
            cash_amount: 10000,
            card_amount: 2000,
            other_amount: 500,
            ..Default::default()
        };
        assert_eq!(payment.tendered(), 12500);
    }

    #[test]
    fn test_tendered_saturates() {
        let input = PaymentInput {
            cash_amount: i64::MAX,
            card_amount: i64::MAX,
            ..Default::default()
        };
        assert_eq!(input.tendered(), i64::MAX);
    }
}
