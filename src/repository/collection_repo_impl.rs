// ==========================================
// CSV Import+ - 宿主集合 Repository 实现 (SQLite)
// ==========================================
// 职责: 以 SQLite 承载笔记类型 / 牌组 / 笔记，实现宿主集合 trait
// 红线: 不含检测/导入规则，只负责数据存取
// ==========================================

use crate::db::{
    configure_sqlite_connection, init_schema, open_sqlite_connection, read_schema_version,
    CURRENT_SCHEMA_VERSION,
};
use crate::domain::{
    ContainerId, ContainerInfo, ContainerSelection, Record, SchemaDescriptor, SchemaId,
    SchemaInfo,
};
use crate::repository::collection_repo::{
    ContainerRepository, RecordRepository, SchemaRepository,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// collection_state 中保存当前牌组的键
const CURRENT_DECK_KEY: &str = "current_deck";

/// 默认牌组名称
pub const DEFAULT_DECK_NAME: &str = "Default";

/// 宿主自带的笔记类型（名称, 字段）
pub const STOCK_NOTE_TYPES: &[(&str, &[&str])] = &[
    ("Basic", &["Front", "Back"]),
    ("Basic (and reversed card)", &["Front", "Back"]),
    ("Basic (optional reversed card)", &["Front", "Back", "Add Reverse"]),
    ("Basic (type in the answer)", &["Front", "Back"]),
    ("Cloze", &["Text", "Back Extra"]),
];

/// 已落库笔记（读取用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNote {
    pub id: i64,
    pub guid: String,
    pub schema_id: SchemaId,
    pub container_id: ContainerId,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
}

// ==========================================
// CollectionRepositoryImpl
// ==========================================
pub struct CollectionRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

/// 建表后校验 schema_version：库由更新版本的程序创建时拒绝打开
fn prepare_schema(conn: &Connection) -> RepositoryResult<()> {
    init_schema(conn)?;
    match read_schema_version(conn)? {
        Some(version) if version > CURRENT_SCHEMA_VERSION => {
            Err(RepositoryError::ValidationError(format!(
                "集合库 schema_version={} 高于当前支持的 {}",
                version, CURRENT_SCHEMA_VERSION
            )))
        }
        _ => Ok(()),
    }
}

impl CollectionRepositoryImpl {
    /// 打开（必要时创建）集合库
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        prepare_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（均幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            prepare_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 共享连接（供 ConfigManager 复用同一库）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入自带笔记类型与默认牌组（幂等）
    ///
    /// # 返回
    /// - 本次新建的笔记类型数量
    pub fn seed_defaults(&self) -> RepositoryResult<usize> {
        let existing: Vec<String> = self
            .list_schemas()?
            .into_iter()
            .map(|s| s.name)
            .collect();

        let mut created = 0;
        for (name, fields) in STOCK_NOTE_TYPES {
            if existing.iter().any(|n| n == name) {
                continue;
            }
            self.create_schema(name, fields)?;
            created += 1;
        }

        let deck = self.get_or_create_container(DEFAULT_DECK_NAME)?;
        if self.current_container()?.is_none() {
            self.select_container(deck.id)?;
        }

        info!(created, "自带笔记类型初始化完成");
        Ok(created)
    }

    /// 新建笔记类型
    pub fn create_schema(&self, name: &str, fields: &[&str]) -> RepositoryResult<SchemaDescriptor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError(
                "笔记类型名称不能为空".to_string(),
            ));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("INSERT INTO note_type (name) VALUES (?1)", params![name])?;
        let id = tx.last_insert_rowid();
        for (ord, field) in fields.iter().enumerate() {
            tx.execute(
                "INSERT INTO note_type_field (note_type_id, ord, name) VALUES (?1, ?2, ?3)",
                params![id, ord as i64, field],
            )?;
        }
        tx.commit()?;

        debug!(id, name, field_count = fields.len(), "新建笔记类型");
        Ok(SchemaDescriptor {
            id,
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// 读取牌组内全部笔记（按写入顺序）
    pub fn notes_in_container(&self, container: ContainerId) -> RepositoryResult<Vec<StoredNote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, guid, note_type_id, deck_id, fields_json, tags
            FROM note
            WHERE deck_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![container], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let (id, guid, schema_id, container_id, fields_json, tags) = row?;
            notes.push(StoredNote {
                id,
                guid,
                schema_id,
                container_id,
                fields: serde_json::from_str(&fields_json)?,
                tags: tags.split_whitespace().map(|t| t.to_string()).collect(),
            });
        }
        Ok(notes)
    }

    fn find_container_by_id(
        conn: &Connection,
        id: ContainerId,
    ) -> RepositoryResult<Option<ContainerInfo>> {
        let found = conn
            .query_row(
                "SELECT id, name FROM deck WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ContainerInfo {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn find_container_by_name(
        conn: &Connection,
        name: &str,
    ) -> RepositoryResult<Option<ContainerInfo>> {
        let found = conn
            .query_row(
                "SELECT id, name FROM deck WHERE name = ?1",
                params![name],
                |row| {
                    Ok(ContainerInfo {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }
}

impl SchemaRepository for CollectionRepositoryImpl {
    fn list_schemas(&self) -> RepositoryResult<Vec<SchemaInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM note_type ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SchemaInfo {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut schemas = Vec::new();
        for row in rows {
            schemas.push(row?);
        }
        Ok(schemas)
    }

    fn get_schema(&self, id: SchemaId) -> RepositoryResult<Option<SchemaDescriptor>> {
        let conn = self.get_conn()?;
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM note_type WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(name) = name else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT name FROM note_type_field WHERE note_type_id = ?1 ORDER BY ord",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
        let mut fields = Vec::new();
        for row in rows {
            fields.push(row?);
        }

        Ok(Some(SchemaDescriptor { id, name, fields }))
    }
}

impl ContainerRepository for CollectionRepositoryImpl {
    fn list_containers(&self) -> RepositoryResult<Vec<ContainerInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM deck ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ContainerInfo {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut decks = Vec::new();
        for row in rows {
            decks.push(row?);
        }
        Ok(decks)
    }

    fn current_container(&self) -> RepositoryResult<Option<ContainerInfo>> {
        let conn = self.get_conn()?;
        let current: Option<String> = conn
            .query_row(
                "SELECT value FROM collection_state WHERE key = ?1",
                params![CURRENT_DECK_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match current.and_then(|v| v.parse::<ContainerId>().ok()) {
            Some(id) => Self::find_container_by_id(&conn, id),
            None => Ok(None),
        }
    }

    fn resolve_container(
        &self,
        selection: &ContainerSelection,
    ) -> RepositoryResult<Option<ContainerInfo>> {
        match selection {
            ContainerSelection::Current => self.current_container(),
            ContainerSelection::ById(id) => {
                let conn = self.get_conn()?;
                Self::find_container_by_id(&conn, *id)
            }
            ContainerSelection::ByName(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Ok(None);
                }
                let conn = self.get_conn()?;
                Self::find_container_by_name(&conn, name)
            }
        }
    }

    fn select_container(&self, id: ContainerId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        if Self::find_container_by_id(&conn, id)?.is_none() {
            return Err(RepositoryError::NotFound {
                entity: "deck".to_string(),
                id: id.to_string(),
            });
        }
        conn.execute(
            r#"
            INSERT INTO collection_state (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![CURRENT_DECK_KEY, id.to_string()],
        )?;
        Ok(())
    }

    fn get_or_create_container(&self, name: &str) -> RepositoryResult<ContainerInfo> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError("牌组名称不能为空".to_string()));
        }

        let conn = self.get_conn()?;
        if let Some(existing) = Self::find_container_by_name(&conn, name)? {
            return Ok(existing);
        }

        conn.execute("INSERT INTO deck (name) VALUES (?1)", params![name])?;
        let id = conn.last_insert_rowid();
        debug!(id, name, "新建牌组");
        Ok(ContainerInfo {
            id,
            name: name.to_string(),
        })
    }
}

impl RecordRepository for CollectionRepositoryImpl {
    fn add_record(&self, record: &Record, container: ContainerId) -> RepositoryResult<i64> {
        let fields_json = serde_json::to_string(record.fields())?;
        let tags = record.tags().join(" ");

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO note (guid, note_type_id, deck_id, fields_json, tags, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                Uuid::new_v4().to_string(),
                record.schema_id,
                container,
                fields_json,
                tags,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
