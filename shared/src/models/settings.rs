//! Store Settings Model (venue-scoped)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a suggested total is snapped to the rounding unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMethod {
    #[default]
    Ceil,
    Floor,
    Round,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub tax_rate_percent: Decimal,
    pub service_fee_percent: Decimal,
    /// Hour (0-23) at which a business day begins
    pub business_day_start_hour: u32,
    /// Yen; 1 disables rounding
    pub rounding_unit: i64,
    #[serde(default)]
    pub rounding_method: RoundingMethod,
    #[serde(default)]
    pub card_fee_rate_percent: Decimal,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            tax_rate_percent: Decimal::from(10),
            service_fee_percent: Decimal::from(15),
            business_day_start_hour: 5,
            rounding_unit: 100,
            rounding_method: RoundingMethod::Ceil,
            card_fee_rate_percent: Decimal::ZERO,
        }
    }
}

impl StoreSettings {
    /// Check ranges; returns the offending field on failure
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.tax_rate_percent.is_sign_negative() {
            return Err("tax_rate_percent");
        }
        if self.service_fee_percent.is_sign_negative() {
            return Err("service_fee_percent");
        }
        if self.business_day_start_hour > 23 {
            return Err("business_day_start_hour");
        }
        if self.rounding_unit < 1 {
            return Err("rounding_unit");
        }
        if self.card_fee_rate_percent.is_sign_negative() {
            return Err("card_fee_rate_percent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StoreSettings::default();
        assert_eq!(settings.tax_rate_percent, Decimal::from(10));
        assert_eq!(settings.service_fee_percent, Decimal::from(15));
        assert_eq!(settings.business_day_start_hour, 5);
        assert_eq!(settings.rounding_unit, 100);
        assert_eq!(settings.rounding_method, RoundingMethod::Ceil);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_hour_and_unit() {
        let settings = StoreSettings {
            business_day_start_hour: 24,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err("business_day_start_hour"));

        let settings = StoreSettings {
            rounding_unit: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err("rounding_unit"));
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "tax_rate_percent": 8,
            "service_fee_percent": 20,
            "business_day_start_hour": 18,
            "rounding_unit": 10
        }"#;
        let settings: StoreSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.tax_rate_percent, Decimal::from(8));
        assert_eq!(settings.rounding_method, RoundingMethod::Ceil);
        assert_eq!(settings.card_fee_rate_percent, Decimal::ZERO);
    }
}
