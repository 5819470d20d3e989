// ==========================================
// CSV Import+ - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入层/仓储层错误为面向用户的提示
// ==========================================

use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("输入为空")]
    InputEmpty,

    #[error("未找到数据行")]
    NoDataRows,

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 目标解析错误
    // ==========================================
    #[error("无法解析目标牌组")]
    ContainerUnresolved,

    #[error("无法解析笔记类型")]
    SchemaUnresolved,

    #[error("所选笔记类型不存在")]
    SchemaNotFound,

    #[error("未知笔记类型: {0}")]
    UnknownSchema(String),

    // ==========================================
    // 子牌组
    // ==========================================
    #[error("子牌组名称为空")]
    SubdeckNameEmpty,

    #[error("子牌组创建失败: {0}")]
    SubdeckCreationFailed(String),

    // ==========================================
    // 导入 / 数据访问错误
    // ==========================================
    #[error("导入失败: {0}")]
    ImportFailed(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向用户的提示（已本地化）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InputEmpty => t("import.input_empty"),
            ApiError::NoDataRows => t("import.no_data_rows"),
            ApiError::ContainerUnresolved => t("import.deck_unresolved"),
            ApiError::SchemaUnresolved => t("import.note_type_unresolved"),
            ApiError::SchemaNotFound => t("import.note_type_not_found"),
            ApiError::UnknownSchema(name) => {
                t_with_args("import.unknown_note_type", &[("name", name.as_str())])
            }
            ApiError::SubdeckNameEmpty => t("subdeck.name_required"),
            ApiError::SubdeckCreationFailed(msg) => {
                t_with_args("subdeck.failed", &[("error", msg.as_str())])
            }
            other => t_with_args("import.failed", &[("error", other.to_string().as_str())]),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::InvalidInput(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::NoDataRows => ApiError::NoDataRows,
            ImportError::FileReadError(msg) => ApiError::InvalidInput(msg),
            err @ ImportError::RecordCreationFailed { .. } => ApiError::ImportFailed(err.to_string()),
            err @ ImportError::CsvParseError(_) => ApiError::ImportFailed(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
