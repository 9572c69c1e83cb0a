//! SettingsService - 店铺设置缓存
//!
//! 设置按店铺读穿缓存 (read-through)，写入时先落库再更新缓存。
//! 未配置的店铺返回默认值 (税率 10%、服务费 15%、营业日 5 点开始)。

use parking_lot::RwLock;
use shared::models::{StoreId, StoreSettings};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{FloorError, FloorResult};
use crate::storage::FloorStore;

#[derive(Clone)]
pub struct SettingsService {
    floor: Arc<dyn FloorStore>,
    cache: Arc<RwLock<HashMap<StoreId, StoreSettings>>>,
}

impl SettingsService {
    pub fn new(floor: Arc<dyn FloorStore>) -> Self {
        Self {
            floor,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, store: StoreId) -> FloorResult<StoreSettings> {
        if let Some(settings) = self.cache.read().get(&store) {
            return Ok(settings.clone());
        }

        let settings = self.floor.get_settings(store)?.unwrap_or_default();
        self.cache.write().insert(store, settings.clone());
        Ok(settings)
    }

    pub fn put(&self, store: StoreId, settings: StoreSettings) -> FloorResult<StoreSettings> {
        settings
            .validate()
            .map_err(|field| FloorError::Validation(format!("invalid value for {}", field)))?;

        self.floor.put_settings(store, &settings)?;
        self.cache.write().insert(store, settings.clone());

        tracing::info!(
            store = store,
            tax_rate = %settings.tax_rate_percent,
            service_fee = %settings.service_fee_percent,
            start_hour = settings.business_day_start_hour,
            "Store settings updated"
        );
        Ok(settings)
    }

    /// Category recorded on receipt lines for a product
    pub fn set_category(&self, store: StoreId, product_name: &str, category: &str) -> FloorResult<()> {
        if product_name.trim().is_empty() || category.trim().is_empty() {
            return Err(FloorError::Validation(
                "product_name and category are required".to_string(),
            ));
        }
        self.floor.put_category(store, product_name.trim(), category.trim())?;
        tracing::debug!(store = store, product = %product_name, category = %category, "Product category set");
        Ok(())
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RedbFloorStore;
    use rust_decimal::Decimal;
    use shared::models::RoundingMethod;

    fn create_test_service() -> (SettingsService, Arc<RedbFloorStore>) {
        let floor = Arc::new(RedbFloorStore::open_in_memory().unwrap());
        (SettingsService::new(floor.clone()), floor)
    }

    #[test]
    fn test_defaults_for_unknown_store() {
        let (service, _) = create_test_service();
        assert_eq!(service.get(7).unwrap(), StoreSettings::default());
        assert_eq!(service.cached_count(), 1);
    }

    #[test]
    fn test_put_persists_and_caches() {
        let (service, floor) = create_test_service();
        let settings = StoreSettings {
            tax_rate_percent: Decimal::from(8),
            business_day_start_hour: 18,
            rounding_method: RoundingMethod::Floor,
            ..Default::default()
        };

        service.put(1, settings.clone()).unwrap();
        assert_eq!(service.get(1).unwrap(), settings);
        assert_eq!(floor.get_settings(1).unwrap(), Some(settings));
    }

    #[test]
    fn test_put_rejects_invalid() {
        let (service, floor) = create_test_service();
        let bad = StoreSettings {
            rounding_unit: 0,
            ..Default::default()
        };

        assert!(matches!(service.put(1, bad), Err(FloorError::Validation(_))));
        assert!(floor.get_settings(1).unwrap().is_none());
    }

    #[test]
    fn test_set_category() {
        let (service, floor) = create_test_service();
        service.set_category(1, "シャンパン", "ボトル").unwrap();
        assert_eq!(floor.category_of(1, "シャンパン").unwrap().as_deref(), Some("ボトル"));
        assert!(service.set_category(1, "", "ボトル").is_err());
    }
}
