// ==========================================
// CSV Import+ - 笔记类型（Schema）领域模型
// ==========================================
// 职责: 宿主笔记类型的只读描述 + 匹配结果
// 红线: 本模块从不修改宿主的笔记类型
// ==========================================

use serde::{Deserialize, Serialize};

/// 宿主笔记类型 ID
pub type SchemaId = i64;

/// 笔记类型列表项（名称 + ID，不含字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub id: SchemaId,
    pub name: String,
}

/// 笔记类型完整描述：名称 + 有序字段名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub id: SchemaId,
    pub name: String,
    pub fields: Vec<String>,
}

impl SchemaDescriptor {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn info(&self) -> SchemaInfo {
        SchemaInfo {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// 自动匹配结果 (名称, 字段数, 在列表中的下标)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub name: String,
    pub field_count: usize,
    pub index: usize,
}
