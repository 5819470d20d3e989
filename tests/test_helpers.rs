// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时 SQLite 集合库 + 内存版宿主（可注入失败）
// ==========================================

#![allow(dead_code)]

use csv_import_plus::app::AppState;
use csv_import_plus::domain::{
    ContainerId, ContainerInfo, ContainerSelection, Record, SchemaDescriptor, SchemaId, SchemaInfo,
};
use csv_import_plus::repository::{
    ContainerRepository, RecordRepository, RepositoryError, RepositoryResult, SchemaRepository,
};
use std::error::Error;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// 创建临时集合库并完成初始化（内置笔记类型 + Default 牌组）
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 已初始化的应用状态
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    csv_import_plus::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();
    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

// ==========================================
// MockHost - 内存版宿主
// ==========================================
pub struct MockHost {
    pub schemas: Vec<SchemaDescriptor>,
    /// list_schemas 会列出、但 get_schema 返回 None 的笔记类型
    pub unreadable: Vec<SchemaId>,
    pub decks: Mutex<Vec<ContainerInfo>>,
    pub current: Mutex<Option<ContainerId>>,
    pub notes: Mutex<Vec<(Record, ContainerId)>>,
    /// 第 N 次 add_record 失败（从 1 开始）
    pub fail_on_add: Option<usize>,
    pub add_calls: Mutex<usize>,
}

impl MockHost {
    /// Basic(Front, Back) + Cloze(Text, Back Extra)，当前牌组 Default
    pub fn stock() -> Self {
        Self {
            schemas: vec![
                schema(1, "Basic", &["Front", "Back"]),
                schema(2, "Cloze", &["Text", "Back Extra"]),
            ],
            unreadable: Vec::new(),
            decks: Mutex::new(vec![ContainerInfo {
                id: 1,
                name: "Default".to_string(),
            }]),
            current: Mutex::new(Some(1)),
            notes: Mutex::new(Vec::new()),
            fail_on_add: None,
            add_calls: Mutex::new(0),
        }
    }

    pub fn without_current_deck(self) -> Self {
        *self.current.lock().unwrap() = None;
        self
    }

    pub fn saved_notes(&self) -> Vec<(Record, ContainerId)> {
        self.notes.lock().unwrap().clone()
    }

    pub fn current_id(&self) -> Option<ContainerId> {
        *self.current.lock().unwrap()
    }
}

pub fn schema(id: SchemaId, name: &str, fields: &[&str]) -> SchemaDescriptor {
    SchemaDescriptor {
        id,
        name: name.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

impl SchemaRepository for MockHost {
    fn list_schemas(&self) -> RepositoryResult<Vec<SchemaInfo>> {
        Ok(self.schemas.iter().map(|s| s.info()).collect())
    }

    fn get_schema(&self, id: SchemaId) -> RepositoryResult<Option<SchemaDescriptor>> {
        if self.unreadable.contains(&id) {
            return Ok(None);
        }
        Ok(self.schemas.iter().find(|s| s.id == id).cloned())
    }
}

impl ContainerRepository for MockHost {
    fn list_containers(&self) -> RepositoryResult<Vec<ContainerInfo>> {
        Ok(self.decks.lock().unwrap().clone())
    }

    fn current_container(&self) -> RepositoryResult<Option<ContainerInfo>> {
        let current = self.current_id();
        Ok(self
            .decks
            .lock()
            .unwrap()
            .iter()
            .find(|d| Some(d.id) == current)
            .cloned())
    }

    fn resolve_container(
        &self,
        selection: &ContainerSelection,
    ) -> RepositoryResult<Option<ContainerInfo>> {
        let current = self.current_id();
        let decks = self.decks.lock().unwrap();
        Ok(match selection {
            ContainerSelection::Current => decks.iter().find(|d| Some(d.id) == current).cloned(),
            ContainerSelection::ById(id) => decks.iter().find(|d| d.id == *id).cloned(),
            ContainerSelection::ByName(name) => {
                decks.iter().find(|d| d.name == name.trim()).cloned()
            }
        })
    }

    fn select_container(&self, id: ContainerId) -> RepositoryResult<()> {
        *self.current.lock().unwrap() = Some(id);
        Ok(())
    }

    fn get_or_create_container(&self, name: &str) -> RepositoryResult<ContainerInfo> {
        let mut decks = self.decks.lock().unwrap();
        if let Some(existing) = decks.iter().find(|d| d.name == name) {
            return Ok(existing.clone());
        }
        let deck = ContainerInfo {
            id: decks.len() as ContainerId + 1,
            name: name.to_string(),
        };
        decks.push(deck.clone());
        Ok(deck)
    }
}

impl RecordRepository for MockHost {
    fn add_record(&self, record: &Record, container: ContainerId) -> RepositoryResult<i64> {
        let mut calls = self.add_calls.lock().unwrap();
        *calls += 1;
        if self.fail_on_add == Some(*calls) {
            return Err(RepositoryError::DatabaseQueryError("disk full".to_string()));
        }
        let mut notes = self.notes.lock().unwrap();
        notes.push((record.clone(), container));
        Ok(notes.len() as i64)
    }
}
