// ==========================================
// CSV Import+ - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================
// 检测阶段的错误一律降级为默认值；这里的变体主要用于导入阶段中止
// 目标牌组 / 笔记类型的解析错误在 API 层（ApiError）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入相关错误 =====
    #[error("未找到数据行")]
    NoDataRows,

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 落库错误 =====
    #[error("笔记写入失败 (行 {row}): {message}")]
    RecordCreationFailed { row: usize, message: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_missing_file_maps_to_read_error() {
        let err = crate::importer::read_input_file(Path::new("/nonexistent/cards.csv")).unwrap_err();
        assert!(matches!(err, ImportError::FileReadError(_)));
    }
}
