//! Draft Order Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upper bound for one line's quantity
pub const MAX_LINE_QUANTITY: u32 = 9_999;
/// Upper bound for a tax-inclusive unit price (yen)
pub const MAX_UNIT_PRICE: i64 = 10_000_000;
/// Upper bound for distinct lines on one draft
pub const MAX_DRAFT_LINES: usize = 200;

/// One line of a table's running (draft) order.
///
/// Two lines are the same line when product name, tax-inclusive unit price
/// and the set of assigned casts all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
    /// Tax-inclusive unit price (yen)
    pub unit_price: i64,
    pub quantity: u32,
    #[serde(default)]
    pub cast_names: BTreeSet<String>,
}

impl OrderLine {
    pub fn new(
        product_name: impl Into<String>,
        unit_price: i64,
        cast_names: BTreeSet<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            unit_price,
            quantity: 1,
            cast_names,
        }
    }

    /// Whether this line has the given identity key
    pub fn matches(&self, product_name: &str, unit_price: i64, cast_names: &BTreeSet<String>) -> bool {
        self.product_name == product_name
            && self.unit_price == unit_price
            && &self.cast_names == cast_names
    }

    /// Tax-inclusive line total
    ///
    /// Saturates so that a stored line that predates the caps cannot panic.
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

/// Add order line payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineAdd {
    pub product_name: String,
    pub unit_price: i64,
    #[serde(default)]
    pub requires_cast: bool,
    #[serde(default)]
    pub cast_names: BTreeSet<String>,
}

/// Update order line payload (quantity and/or unit price)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderLineUpdate {
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn casts(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identity_ignores_cast_order() {
        let line = OrderLine::new("シャンパン", 8000, casts(&["Mio", "Ami"]));
        assert!(line.matches("シャンパン", 8000, &casts(&["Ami", "Mio"])));
        assert!(!line.matches("シャンパン", 9000, &casts(&["Ami", "Mio"])));
        assert!(!line.matches("シャンパン", 8000, &casts(&["Ami"])));
    }

    #[test]
    fn test_line_total() {
        let mut line = OrderLine::new("ビール", 500, BTreeSet::new());
        line.quantity = 3;
        assert_eq!(line.line_total(), 1500);
    }

    #[test]
    fn test_line_total_saturates() {
        let mut line = OrderLine::new("ボトル", i64::MAX / 2, BTreeSet::new());
        line.quantity = u32::MAX;
        assert_eq!(line.line_total(), i64::MAX);
    }

    #[test]
    fn test_caps_bound_draft_total() {
        let worst = MAX_UNIT_PRICE
            .checked_mul(i64::from(MAX_LINE_QUANTITY))
            .and_then(|v| v.checked_mul(MAX_DRAFT_LINES as i64));
        assert!(worst.is_some());
    }
}
