//! Floor Server - 店内楼面管理引擎
//!
//! # 架构概述
//!
//! 跟踪桌台占用、客人与指名キャスト、每桌草稿订单，
//! 并把草稿结账为带税额拆分的不可变小票。
//!
//! - **桌台** (`tables`): 布局与占用状态
//! - **草稿订单** (`orders`): 明细合并规则
//! - **换桌** (`moving`): 长按手势状态机与原子换桌
//! - **结账** (`checkout`): 金额计算与分步持久化
//! - **存储** (`storage`): redb 嵌入式存储
//! - **HTTP API** (`api`): 面向前端的 JSON 接口
//!
//! # 模块结构
//!
//! ```text
//! floor-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── storage/       # FloorStore trait + redb 实现
//! ├── tables/        # TableRegistry
//! ├── orders/        # OrderAggregator
//! ├── moving/        # MoveCoordinator、长按计时器、relocate
//! ├── checkout/      # 金额计算 + CheckoutService
//! ├── receipts/      # 小票查询 / 作废
//! ├── settings/      # 店铺设置
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、营业日
//! ```

pub mod api;
pub mod checkout;
pub mod core;
pub mod moving;
pub mod orders;
pub mod receipts;
pub mod settings;
pub mod storage;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use checkout::{CheckoutRequest, CheckoutService};
pub use core::{Config, FloorError, FloorResult, Server, ServerState};
pub use moving::{GestureOutcome, LongPressTimer, MoveCoordinator};
pub use orders::{AddOutcome, OrderAggregator};
pub use storage::{FloorStore, RedbFloorStore};
pub use tables::TableRegistry;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境：加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    // .env 不存在时忽略
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
    }

    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ________
   / ____/ /___  ____  _____
  / /_  / / __ \/ __ \/ ___/
 / __/ / / /_/ / /_/ / /
/_/   /_/\____/\____/_/
    "#
    );
}
