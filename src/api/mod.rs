// ==========================================
// CSV Import+ - API 层
// ==========================================
// 职责: 提供内容分析 / 快速导入 / 子牌组接口，供命令行调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{
    render_outcome, render_status, render_subdeck_created, ImportApi, QuickImportResponse,
};
