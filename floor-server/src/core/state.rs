use std::sync::Arc;

use anyhow::Context;

use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::orders::OrderAggregator;
use crate::receipts::ReceiptService;
use crate::settings::SettingsService;
use crate::storage::{FloorStore, RedbFloorStore};
use crate::tables::TableRegistry;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有服务共享同一个 [`FloorStore`]，克隆只复制 `Arc`。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | floor | 存储实现 |
/// | tables | 桌台布局与占用 |
/// | orders | 草稿订单 |
/// | checkout | 结账 |
/// | receipts | 小票查询 / 作废 |
/// | settings | 店铺设置缓存 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub floor: Arc<dyn FloorStore>,
    pub tables: TableRegistry,
    pub orders: OrderAggregator,
    pub checkout: CheckoutService,
    pub receipts: ReceiptService,
    pub settings: SettingsService,
}

impl ServerState {
    /// 打开工作目录下的数据库并创建所有服务
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("Failed to create work dir {}", config.work_dir))?;

        let path = config.database_path();
        let floor = RedbFloorStore::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        tracing::info!(path = %path.display(), "Database opened");

        Ok(Self::with_store(config.clone(), Arc::new(floor)))
    }

    /// 使用已有存储创建状态 (测试使用内存存储)
    pub fn with_store(config: Config, floor: Arc<dyn FloorStore>) -> Self {
        Self {
            tables: TableRegistry::new(floor.clone()),
            orders: OrderAggregator::new(floor.clone()),
            checkout: CheckoutService::new(floor.clone()),
            receipts: ReceiptService::new(floor.clone()),
            settings: SettingsService::new(floor.clone()),
            floor,
            config,
        }
    }

    /// Current wall-clock time in the venue timezone
    pub fn now(&self) -> chrono::NaiveDateTime {
        crate::utils::time::local_now(self.config.timezone)
    }
}
