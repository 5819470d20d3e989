// ==========================================
// CSV Import+ - 核心库
// ==========================================
// 职责: CSV 文本 → 闪卡笔记的批量导入助手
// 流程: 指令提取 → 分隔符检测 → 笔记类型匹配 → 逐行建笔记
// 宿主: 笔记类型 / 牌组 / 笔记存取全部经由 repository trait
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 宿主集合访问
pub mod repository;

// 导入层 - 检测与批量导入
pub mod importer;

// 配置层 - 检测参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 导入编排
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AnalysisOptions, ContainerInfo, ContainerSelection, ContentAnalysis, CsvFormat, Delimiter,
    DelimiterMode, Directives, FormatStatus, ImportOutcome, ImportRequest, MatchResult, Record,
    SchemaChoice, SchemaDescriptor, SchemaInfo, SchemaSource,
};

// 导入层
pub use importer::{
    auto_pick_schema, detect_csv_format, extract_directives, strip_directive_lines,
    BulkImporterImpl, DelimiterDetector, NoteImporter,
};

// API
pub use api::{ApiError, ApiResult, ImportApi, QuickImportResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "CSV Import+";
