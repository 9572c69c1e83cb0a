//! 结账金额计算 (纯函数)
//!
//! 单价均为含税整数日元。税额按单价逐一拆分：
//! `unit_excl = round(unit / (1 + rate))` (四舍五入，0.5 远离零)，
//! 服务费为含税小计乘以服务费率后向下取整，
//! 与操作员确认的应收金额之差记为调整额。

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::models::{
    FinalizedOrder, FinalizedOrderLine, Occupancy, OrderLine, Payment, PaymentInput, RoundingMethod,
    StoreId, StoreSettings,
};
use serde::Serialize;

use crate::core::{FloorError, FloorResult};
use crate::orders::subtotal;
use crate::utils::time::business_date_of;

/// Everything a checkout needs besides storage
#[derive(Debug, Clone)]
pub struct CheckoutInput<'a> {
    pub store: StoreId,
    pub table: &'a str,
    pub checkout_time: NaiveDateTime,
    pub lines: &'a [OrderLine],
    pub occupancy: &'a Occupancy,
    pub payment: &'a PaymentInput,
    pub discount_amount: i64,
    /// Operator-confirmed amount due
    pub total_amount: i64,
    pub tax_rate_percent: Decimal,
    pub service_fee_percent: Decimal,
    pub business_day_start_hour: u32,
}

/// Receipt header (lines without categories) and payment, not yet persisted
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    pub order: FinalizedOrder,
    pub payment: Payment,
}

/// Preview shown before payment is entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub subtotal: i64,
    pub service_charge: i64,
    pub total_before_rounding: i64,
    pub suggested_total: i64,
    pub rounding_adjustment: i64,
}

fn percent(rate: Decimal) -> Decimal {
    rate / Decimal::ONE_HUNDRED
}

fn to_yen(value: Decimal) -> FloorResult<i64> {
    value
        .to_i64()
        .ok_or_else(|| FloorError::Validation(format!("amount out of range: {}", value)))
}

fn overflow(what: &str) -> FloorError {
    FloorError::Validation(format!("{} out of range", what))
}

fn check_rate(name: &str, rate: Decimal) -> FloorResult<()> {
    if rate.is_sign_negative() {
        return Err(FloorError::Validation(format!("{} must not be negative", name)));
    }
    Ok(())
}

/// Tax-exclusive unit price, half away from zero
pub fn unit_price_excl_tax(unit_price: i64, tax_rate_percent: Decimal) -> FloorResult<i64> {
    check_rate("tax_rate_percent", tax_rate_percent)?;
    let divisor = Decimal::ONE + percent(tax_rate_percent);
    let excl = Decimal::from(unit_price)
        .checked_div(divisor)
        .ok_or_else(|| FloorError::Validation("invalid tax rate".to_string()))?;
    to_yen(excl.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// `floor(subtotal × fee%)`
pub fn service_charge(subtotal_incl_tax: i64, service_fee_percent: Decimal) -> FloorResult<i64> {
    check_rate("service_fee_percent", service_fee_percent)?;
    to_yen((Decimal::from(subtotal_incl_tax) * percent(service_fee_percent)).floor())
}

/// `floor(card × rate%)`; zero when either side is zero
pub fn card_fee(card_amount: i64, rate_percent: Decimal) -> FloorResult<i64> {
    if card_amount <= 0 || rate_percent <= Decimal::ZERO {
        return Ok(0);
    }
    to_yen((Decimal::from(card_amount) * percent(rate_percent)).floor())
}

pub fn round_to_unit(amount: i64, unit: i64, method: RoundingMethod) -> i64 {
    if unit <= 1 {
        return amount;
    }
    match method {
        RoundingMethod::Floor => amount.div_euclid(unit) * unit,
        RoundingMethod::Ceil => -((-amount).div_euclid(unit)) * unit,
        RoundingMethod::Round => (amount + unit / 2).div_euclid(unit) * unit,
    }
}

/// `{table}-{YYYYMMDDHHMMSSmmm}`
pub fn receipt_number(table: &str, checkout_time: NaiveDateTime) -> String {
    format!("{}-{}", table, checkout_time.format("%Y%m%d%H%M%S%3f"))
}

pub fn change_amount(tendered: i64, total_amount: i64) -> i64 {
    (tendered - total_amount).max(0)
}

pub fn quote(lines: &[OrderLine], settings: &StoreSettings) -> FloorResult<CheckoutQuote> {
    let subtotal = subtotal(lines);
    let service_charge = service_charge(subtotal, settings.service_fee_percent)?;
    let total_before_rounding = subtotal + service_charge;
    let suggested_total = round_to_unit(
        total_before_rounding,
        settings.rounding_unit,
        settings.rounding_method,
    );

    Ok(CheckoutQuote {
        subtotal,
        service_charge,
        total_before_rounding,
        suggested_total,
        rounding_adjustment: suggested_total - total_before_rounding,
    })
}

/// Receipt figures for a checkout; writes nothing
pub fn compute_breakdown(input: &CheckoutInput<'_>) -> FloorResult<Breakdown> {
    let mut lines = Vec::with_capacity(input.lines.len());
    let mut subtotal_excl_tax = 0;
    for line in input.lines {
        let unit_excl = unit_price_excl_tax(line.unit_price, input.tax_rate_percent)?;
        subtotal_excl_tax = unit_excl
            .checked_mul(i64::from(line.quantity))
            .and_then(|v| v.checked_add(subtotal_excl_tax))
            .ok_or_else(|| overflow("subtotal_excl_tax"))?;
        lines.push(FinalizedOrderLine {
            category: None,
            product_name: line.product_name.clone(),
            cast_names: line.cast_names.iter().cloned().collect(),
            unit_price: line.unit_price,
            unit_price_excl_tax: unit_excl,
            quantity: line.quantity,
            subtotal: line.line_total(),
        });
    }

    let subtotal_incl_tax = subtotal(input.lines);
    let service_charge = service_charge(subtotal_incl_tax, input.service_fee_percent)?;
    let rounding_adjustment = subtotal_incl_tax
        .checked_add(service_charge)
        .and_then(|v| input.total_amount.checked_sub(v))
        .ok_or_else(|| overflow("rounding_adjustment"))?;
    let receipt_number = receipt_number(input.table, input.checkout_time);

    let occupancy = input.occupancy;
    let order = FinalizedOrder {
        receipt_number,
        store_id: input.store,
        table_name: input.table.to_string(),
        visit_datetime: occupancy.entry_time,
        checkout_datetime: input.checkout_time,
        guest_name: occupancy.guest_name.clone(),
        staff_name: occupancy
            .cast_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        visit_type: occupancy.visit_type.clone(),
        subtotal_excl_tax,
        tax_amount: subtotal_incl_tax - subtotal_excl_tax,
        service_charge,
        rounding_adjustment,
        discount_amount: input.discount_amount,
        total_incl_tax: input.total_amount,
        order_date: business_date_of(input.checkout_time, input.business_day_start_hour),
        deleted_at: None,
        deleted_by: None,
        lines,
    };

    let payment = Payment {
        cash_amount: input.payment.cash_amount,
        card_amount: input.payment.card_amount,
        other_amount: input.payment.other_amount,
        other_method: input.payment.other_method.clone(),
        card_fee: input.payment.card_fee,
        change_amount: change_amount(input.payment.tendered(), input.total_amount),
    };

    Ok(Breakdown { order, payment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(h, min, s, ms)
            .unwrap()
    }

    fn lines() -> Vec<OrderLine> {
        let mut beer = OrderLine::new("ビール", 500, BTreeSet::new());
        beer.quantity = 2;
        let champagne = OrderLine::new("シャンパン", 8000, ["Ami".to_string()].into_iter().collect());
        vec![beer, champagne]
    }

    fn input<'a>(
        lines: &'a [OrderLine],
        occupancy: &'a Occupancy,
        payment: &'a PaymentInput,
        total_amount: i64,
        tax: i64,
        service: i64,
    ) -> CheckoutInput<'a> {
        CheckoutInput {
            store: 1,
            table: "A1",
            checkout_time: ts(2025, 3, 10, 23, 30, 0, 0),
            lines,
            occupancy,
            payment,
            discount_amount: 0,
            total_amount,
            tax_rate_percent: Decimal::from(tax),
            service_fee_percent: Decimal::from(service),
            business_day_start_hour: 5,
        }
    }

    fn occupancy() -> Occupancy {
        Occupancy {
            guest_name: "田中".to_string(),
            cast_names: ["Ami".to_string(), "Rei".to_string()].into_iter().collect(),
            entry_time: Some(ts(2025, 3, 10, 21, 0, 0, 0)),
            visit_type: Some("指名".to_string()),
        }
    }

    #[test]
    fn test_unit_price_excl_tax_rounds_half_away_from_zero() {
        let ten = Decimal::from(10);
        assert_eq!(unit_price_excl_tax(500, ten).unwrap(), 455); // 454.545...
        assert_eq!(unit_price_excl_tax(8000, ten).unwrap(), 7273); // 7272.72...
        assert_eq!(unit_price_excl_tax(1100, ten).unwrap(), 1000);
        assert_eq!(unit_price_excl_tax(55, ten).unwrap(), 50);
        assert_eq!(unit_price_excl_tax(1000, Decimal::ZERO).unwrap(), 1000);
        assert!(unit_price_excl_tax(1000, Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_midpoint_goes_up() {
        // 0.5 and 1.5
        assert_eq!(unit_price_excl_tax(1, Decimal::from(100)).unwrap(), 1);
        assert_eq!(unit_price_excl_tax(3, Decimal::from(100)).unwrap(), 2);
    }

    #[test]
    fn test_service_charge_floors() {
        assert_eq!(service_charge(9000, Decimal::from(15)).unwrap(), 1350);
        assert_eq!(service_charge(999, Decimal::from(15)).unwrap(), 149); // 149.85
        assert_eq!(service_charge(999, Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_card_fee_floors() {
        assert_eq!(card_fee(10000, Decimal::new(35, 1)).unwrap(), 350);
        assert_eq!(card_fee(999, Decimal::new(35, 1)).unwrap(), 34); // 34.965
        assert_eq!(card_fee(0, Decimal::from(5)).unwrap(), 0);
        assert_eq!(card_fee(1000, Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_round_to_unit_modes() {
        assert_eq!(round_to_unit(10350, 100, RoundingMethod::Ceil), 10400);
        assert_eq!(round_to_unit(10350, 100, RoundingMethod::Floor), 10300);
        assert_eq!(round_to_unit(10350, 100, RoundingMethod::Round), 10400);
        assert_eq!(round_to_unit(10349, 100, RoundingMethod::Round), 10300);
        assert_eq!(round_to_unit(10400, 100, RoundingMethod::Ceil), 10400);
        assert_eq!(round_to_unit(10351, 1, RoundingMethod::Ceil), 10351);
        assert_eq!(round_to_unit(1234, 1000, RoundingMethod::Ceil), 2000);
    }

    #[test]
    fn test_receipt_number_format() {
        let at = ts(2025, 3, 10, 23, 45, 6, 789);
        assert_eq!(receipt_number("A1", at), "A1-20250310234506789");
        assert_eq!(receipt_number("VIP", ts(2025, 1, 2, 3, 4, 5, 6)), "VIP-20250102030405006");
    }

    #[test]
    fn test_change_never_negative() {
        assert_eq!(change_amount(12000, 10400), 1600);
        assert_eq!(change_amount(10400, 10400), 0);
        assert_eq!(change_amount(5000, 10400), 0);
    }

    #[test]
    fn test_quote_uses_store_rounding() {
        let settings = StoreSettings::default();
        let quote = quote(&lines(), &settings).unwrap();
        assert_eq!(
            quote,
            CheckoutQuote {
                subtotal: 9000,
                service_charge: 1350,
                total_before_rounding: 10350,
                suggested_total: 10400,
                rounding_adjustment: 50,
            }
        );

        let floor = StoreSettings {
            rounding_method: RoundingMethod::Floor,
            ..Default::default()
        };
        let quote = super::quote(&lines(), &floor).unwrap();
        assert_eq!(quote.suggested_total, 10300);
        assert_eq!(quote.rounding_adjustment, -50);
    }

    #[test]
    fn test_compute_breakdown_scenario() {
        let lines = lines();
        let occupancy = occupancy();
        let payment = PaymentInput {
            cash_amount: 12000,
            ..Default::default()
        };
        let input = CheckoutInput {
            store: 1,
            table: "A1",
            checkout_time: ts(2025, 3, 11, 2, 30, 0, 125),
            lines: &lines,
            occupancy: &occupancy,
            payment: &payment,
            discount_amount: 0,
            total_amount: 10400,
            tax_rate_percent: Decimal::from(10),
            service_fee_percent: Decimal::from(15),
            business_day_start_hour: 5,
        };

        let Breakdown { order, payment } = compute_breakdown(&input).unwrap();
        assert_eq!(order.receipt_number, "A1-20250311023000125");
        assert_eq!(order.subtotal_excl_tax, 455 * 2 + 7273);
        assert_eq!(order.tax_amount, 9000 - 8183);
        assert_eq!(order.service_charge, 1350);
        assert_eq!(order.rounding_adjustment, 50);
        assert_eq!(order.total_incl_tax, 10400);
        // 02:30 belongs to the previous business day
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(order.staff_name, "Ami, Rei");
        assert_eq!(order.guest_name, "田中");
        assert_eq!(order.visit_datetime, occupancy.entry_time);

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].unit_price_excl_tax, 455);
        assert_eq!(order.lines[0].subtotal, 1000);
        assert_eq!(order.lines[1].cast_names, vec!["Ami".to_string()]);

        assert_eq!(payment.change_amount, 1600);
        assert_eq!(payment.cash_amount, 12000);
    }

    #[test]
    fn test_bottle_with_cast_at_ten_percent_service() {
        let mut beer = OrderLine::new("ビール", 500, BTreeSet::new());
        beer.quantity = 2;
        let bottle = OrderLine::new("ボトル", 8000, ["Rin".to_string()].into_iter().collect());
        let lines = vec![beer, bottle];
        let occupancy = occupancy();
        let payment = PaymentInput {
            cash_amount: 12000,
            ..Default::default()
        };

        let Breakdown { order, payment } =
            compute_breakdown(&input(&lines, &occupancy, &payment, 11770, 10, 10)).unwrap();
        assert_eq!(order.subtotal_excl_tax, 8183);
        assert_eq!(order.tax_amount, 817);
        assert_eq!(order.service_charge, 900);
        assert_eq!(order.rounding_adjustment, 1870);
        assert_eq!(order.total_incl_tax, 11770);
        assert_eq!(order.lines[1].unit_price_excl_tax, 7273);
        assert_eq!(order.lines[1].cast_names, vec!["Rin".to_string()]);
        assert_eq!(payment.change_amount, 230);
    }

    #[test]
    fn test_receipt_figures_always_reconcile() {
        let prices = [1, 55, 99, 500, 1100, 3333, 8000, 12345];
        let quantities = [1, 2, 3, 7];
        let occupancy = occupancy();
        let payment = PaymentInput::default();

        for tax in [0, 8, 10] {
            for service in [0, 10, 15, 20] {
                for (i, price) in prices.iter().enumerate() {
                    let mut lines = Vec::new();
                    for (j, quantity) in quantities.iter().enumerate() {
                        let mut line = OrderLine::new(
                            format!("品{}", j),
                            price + (i * j) as i64,
                            BTreeSet::new(),
                        );
                        line.quantity = *quantity;
                        lines.push(line);
                    }
                    let incl = subtotal(&lines);

                    for total in [0, incl, incl + 777, incl * 2] {
                        let input = input(&lines, &occupancy, &payment, total, tax, service);
                        let order = compute_breakdown(&input).unwrap().order;
                        assert_eq!(order.subtotal_excl_tax + order.tax_amount, incl);
                        assert_eq!(
                            incl + order.service_charge + order.rounding_adjustment,
                            order.total_incl_tax
                        );
                        assert_eq!(order.total_incl_tax, total);
                        let line_sum: i64 = order.lines.iter().map(|l| l.subtotal).sum();
                        assert_eq!(line_sum, incl);
                    }
                }
            }
        }
    }
}
