// ==========================================
// CSV Import+ - 导入领域模型
// ==========================================
// 职责: 指令集合、导入结果等一次性（按交互重算）的实体
// ==========================================

use crate::domain::record::ContainerSelection;
use crate::domain::schema::SchemaInfo;
use crate::domain::types::{Delimiter, DelimiterMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 强制指定笔记类型的指令键
pub const NOTETYPE_DIRECTIVE: &str = "notetype";

// ==========================================
// Directives - 前导注释指令
// ==========================================
// 键统一小写；同一键重复出现时后者覆盖前者
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives(HashMap<String, String>);

impl Directives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_lowercase(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// `#notetype:` 指令值（空值视为未指定）
    pub fn notetype(&self) -> Option<&str> {
        self.get(NOTETYPE_DIRECTIVE).filter(|v| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Directives {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut directives = Directives::new();
        for (k, v) in iter {
            directives.insert(k.as_ref(), v.as_ref());
        }
        directives
    }
}

// ==========================================
// CsvFormat - 格式检测结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvFormat {
    pub delimiter: Delimiter,
    /// 用该分隔符解析完整正文得到的行数
    pub row_count: usize,
}

// ==========================================
// ImportOutcome - 批量导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// 新增笔记数
    pub added: usize,
    /// 因整行为空而跳过的行数
    pub skipped_empty: usize,
    /// 实际使用的分隔符
    pub delimiter: Delimiter,
}

// ==========================================
// 笔记类型来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    /// 调用方显式指定
    Override,
    /// `#notetype:` 指令
    Directive,
    /// 自动匹配
    Detected,
}

/// 选定的笔记类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChoice {
    pub schema: SchemaInfo,
    pub field_count: usize,
    /// 在宿主笔记类型列表中的下标
    pub index: usize,
    pub source: SchemaSource,
}

// ==========================================
// 内容分析（每次内容/选项变化后重算）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormatStatus {
    Detected { format: CsvFormat, auto: bool },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub directives: Directives,
    /// 剥离指令块后的正文
    pub body: String,
    pub format: FormatStatus,
    pub schema: Option<SchemaChoice>,
}

impl ContentAnalysis {
    pub fn delimiter(&self) -> Option<Delimiter> {
        match &self.format {
            FormatStatus::Detected { format, .. } => Some(format.delimiter),
            FormatStatus::Failed { .. } => None,
        }
    }
}

/// 内容分析选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub delimiter_mode: DelimiterMode,
    /// 用户已勾选"首行为表头"
    pub header_hint: bool,
}

// ==========================================
// 快速导入请求
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub container: ContainerSelection,
    /// 显式指定的笔记类型名称（优先于指令与自动匹配）
    pub schema_override: Option<String>,
    pub delimiter_mode: DelimiterMode,
    pub header_present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_keys_case_insensitive() {
        let directives: Directives = [("NoteType", "Cloze")].into_iter().collect();
        assert_eq!(directives.get("notetype"), Some("Cloze"));
        assert_eq!(directives.notetype(), Some("Cloze"));
    }

    #[test]
    fn test_blank_notetype_is_unset() {
        let directives: Directives = [("notetype", "  ")].into_iter().collect();
        assert_eq!(directives.notetype(), None);
        assert_eq!(directives.len(), 1);
    }
}
