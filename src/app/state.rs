// ==========================================
// CSV Import+ - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::ImportApi;
use crate::config::ConfigManager;
use crate::repository::CollectionRepositoryImpl;

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "CSV_IMPORT_PLUS_DB_PATH";

/// 应用状态
///
/// 宿主集合、配置与 API 共用同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 宿主集合（笔记类型 / 牌组 / 笔记）
    pub collection: Arc<CollectionRepositoryImpl>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 导入API
    pub import_api: Arc<ImportApi<Arc<CollectionRepositoryImpl>>>,

    /// 本次启动新写入的内置笔记类型数
    pub seeded_note_types: usize,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开（必要时创建）集合数据库并建表
    /// 2. 补齐内置笔记类型与默认牌组（幂等）
    /// 3. 创建配置管理器与 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let collection = Arc::new(
            CollectionRepositoryImpl::new(&db_path)
                .map_err(|e| format!("无法打开集合数据库: {}", e))?,
        );
        let seeded_note_types = collection
            .seed_defaults()
            .map_err(|e| format!("内置笔记类型初始化失败: {}", e))?;

        let config = Arc::new(
            ConfigManager::from_connection(collection.connection())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let import_api =
            Arc::new(ImportApi::new(collection.clone()).with_config(config.clone()));

        tracing::info!(seeded_note_types, "AppState初始化成功");
        Ok(Self {
            db_path,
            collection,
            config,
            import_api,
            seeded_note_types,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./csv_import_plus.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("csv-import-plus");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("csv_import_plus.db");
        }
    }

    path.to_string_lossy().to_string()
}
