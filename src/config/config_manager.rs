// ==========================================
// CSV Import+ - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_config_trait::DetectionSettings;
use crate::db::open_sqlite_connection;
use crate::domain::DelimiterMode;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（与集合库共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供命令行复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 列出 global scope 的全部配置
    pub fn list_global_configs(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut configs = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            configs.insert(key, value);
        }
        Ok(configs)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置；非法值（非数字 / 0）回退默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                warn!(config_key = key, value = %value, default, "配置值非法，使用默认值");
                Ok(default)
            }
        }
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_sniff_sample_chars(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(
            config_keys::SNIFF_SAMPLE_CHARS,
            DetectionSettings::DEFAULT_SNIFF_SAMPLE_CHARS,
        )
    }

    fn get_fallback_line_limit(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(
            config_keys::FALLBACK_LINE_LIMIT,
            DetectionSettings::DEFAULT_FALLBACK_LINE_LIMIT,
        )
    }

    fn get_schema_sample_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(
            config_keys::SCHEMA_SAMPLE_ROWS,
            DetectionSettings::DEFAULT_SCHEMA_SAMPLE_ROWS,
        )
    }

    fn get_header_sniff_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(
            config_keys::HEADER_SNIFF_ROWS,
            DetectionSettings::DEFAULT_HEADER_SNIFF_ROWS,
        )
    }

    fn get_default_delimiter_mode(&self) -> Result<DelimiterMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_DELIMITER_MODE, "auto")?;
        match value.parse::<DelimiterMode>() {
            Ok(mode) => Ok(mode),
            Err(e) => {
                warn!(value = %value, error = %e, "默认分隔符配置非法，使用自动检测");
                Ok(DelimiterMode::Auto)
            }
        }
    }

    fn get_ui_locale(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::UI_LOCALE, "en")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 检测参数
    pub const SNIFF_SAMPLE_CHARS: &str = "sniff_sample_chars";
    pub const FALLBACK_LINE_LIMIT: &str = "fallback_line_limit";
    pub const SCHEMA_SAMPLE_ROWS: &str = "schema_sample_rows";
    pub const HEADER_SNIFF_ROWS: &str = "header_sniff_rows";

    // 界面默认值
    pub const DEFAULT_DELIMITER_MODE: &str = "default_delimiter_mode";
    pub const UI_LOCALE: &str = "ui_locale";
}
