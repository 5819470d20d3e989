// ==========================================
// CSV Import+ - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 宿主集合能力（笔记类型 / 牌组 / 笔记）的接口与 SQLite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod collection_repo;
pub mod collection_repo_impl;
pub mod error;

// 重导出核心仓储
pub use collection_repo::{
    CollectionRepository, ContainerRepository, RecordRepository, SchemaRepository,
};
pub use collection_repo_impl::{
    CollectionRepositoryImpl, StoredNote, DEFAULT_DECK_NAME, STOCK_NOTE_TYPES,
};
pub use error::{RepositoryError, RepositoryResult};
