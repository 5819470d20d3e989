// ==========================================
// CSV Import+ - 领域模型层
// ==========================================
// 职责: 定义分隔符、笔记类型、牌组、笔记、导入结果等领域实体
// 红线: 不含数据访问逻辑,不含检测/导入逻辑
// ==========================================

pub mod import;
pub mod record;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use import::{
    AnalysisOptions, ContentAnalysis, CsvFormat, Directives, FormatStatus, ImportOutcome,
    ImportRequest, SchemaChoice, SchemaSource, NOTETYPE_DIRECTIVE,
};
pub use record::{ContainerId, ContainerInfo, ContainerSelection, Record};
pub use schema::{MatchResult, SchemaDescriptor, SchemaId, SchemaInfo};
pub use types::{Delimiter, DelimiterMode};
