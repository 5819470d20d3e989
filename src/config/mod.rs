// ==========================================
// CSV Import+ - 配置层
// ==========================================
// 职责: 检测参数与界面默认值的读取/覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{DetectionSettings, ImportConfigReader};
