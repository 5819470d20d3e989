// ==========================================
// CSV Import+ - 导入配置读取 Trait
// ==========================================
// 职责: 定义检测/导入所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::DelimiterMode;
use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// DetectionSettings - 检测参数快照
// ==========================================
// 默认值即内置常量；每次检测前从配置读取一次，不缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// 嗅探 / 表头判断使用的样本长度（字符数）
    pub sniff_sample_chars: usize,
    /// 回退统计只看样本前 N 行
    pub fallback_line_limit: usize,
    /// 笔记类型匹配时参与列数统计的数据行数
    pub schema_sample_rows: usize,
    /// 表头嗅探最多检查的数据行数
    pub header_sniff_rows: usize,
}

impl DetectionSettings {
    pub const DEFAULT_SNIFF_SAMPLE_CHARS: usize = 2048;
    pub const DEFAULT_FALLBACK_LINE_LIMIT: usize = 5;
    pub const DEFAULT_SCHEMA_SAMPLE_ROWS: usize = 20;
    pub const DEFAULT_HEADER_SNIFF_ROWS: usize = 20;
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            sniff_sample_chars: Self::DEFAULT_SNIFF_SAMPLE_CHARS,
            fallback_line_limit: Self::DEFAULT_FALLBACK_LINE_LIMIT,
            schema_sample_rows: Self::DEFAULT_SCHEMA_SAMPLE_ROWS,
            header_sniff_rows: Self::DEFAULT_HEADER_SNIFF_ROWS,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 检测/导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    // ===== 检测参数 =====

    /// 嗅探样本长度（字符）
    ///
    /// # 默认值
    /// - 2048
    fn get_sniff_sample_chars(&self) -> Result<usize, Box<dyn Error>>;

    /// 回退统计行数上限
    ///
    /// # 默认值
    /// - 5
    fn get_fallback_line_limit(&self) -> Result<usize, Box<dyn Error>>;

    /// 笔记类型匹配的列数采样行数
    ///
    /// # 默认值
    /// - 20
    fn get_schema_sample_rows(&self) -> Result<usize, Box<dyn Error>>;

    /// 表头嗅探检查行数
    ///
    /// # 默认值
    /// - 20
    fn get_header_sniff_rows(&self) -> Result<usize, Box<dyn Error>>;

    // ===== 界面默认值 =====

    /// 默认分隔符模式
    ///
    /// # 默认值
    /// - Auto
    fn get_default_delimiter_mode(&self) -> Result<DelimiterMode, Box<dyn Error>>;

    /// 界面语言
    ///
    /// # 默认值
    /// - "en"
    fn get_ui_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 汇总为一次检测使用的参数
    fn get_detection_settings(&self) -> Result<DetectionSettings, Box<dyn Error>> {
        Ok(DetectionSettings {
            sniff_sample_chars: self.get_sniff_sample_chars()?,
            fallback_line_limit: self.get_fallback_line_limit()?,
            schema_sample_rows: self.get_schema_sample_rows()?,
            header_sniff_rows: self.get_header_sniff_rows()?,
        })
    }
}
