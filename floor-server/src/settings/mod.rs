//! 店铺设置

mod service;

pub use service::SettingsService;
