// ==========================================
// CSV Import+ - 牌组 / 笔记领域模型
// ==========================================
// 职责: 容器（牌组）与记录（笔记）的宿主无关表示
// ==========================================

use crate::domain::schema::SchemaId;
use serde::{Deserialize, Serialize};

/// 宿主牌组 ID
pub type ContainerId = i64;

/// 牌组列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
}

/// 用户对目标牌组的选择
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerSelection {
    /// 宿主当前牌组
    Current,
    ById(ContainerId),
    ByName(String),
}

impl Default for ContainerSelection {
    fn default() -> Self {
        ContainerSelection::Current
    }
}

// ==========================================
// Record - 待落库的笔记
// ==========================================
// 字段槽位数在创建时按笔记类型固定，只能按位置赋值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub schema_id: SchemaId,
    fields: Vec<String>,
    tags: Vec<String>,
}

impl Record {
    pub fn new(schema_id: SchemaId, field_count: usize) -> Self {
        Self {
            schema_id,
            fields: vec![String::new(); field_count],
            tags: Vec::new(),
        }
    }

    /// 按位置写入字段；越界返回 false 且不做任何修改
    pub fn set_field(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.fields.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_slots_fixed_by_schema() {
        let mut record = Record::new(1, 2);
        assert!(record.set_field(0, "Q"));
        assert!(record.set_field(1, "A"));
        assert!(!record.set_field(2, "extra"));
        assert_eq!(record.fields(), &["Q".to_string(), "A".to_string()]);
        assert!(record.tags().is_empty());
    }
}
