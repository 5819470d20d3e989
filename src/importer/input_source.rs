// ==========================================
// CSV Import+ - 输入来源
// ==========================================
// 职责: 粘贴文本 / 文件文本 → 当前生效的原始输入
// 规则: 非空白的粘贴文本优先；否则使用文件文本；两者都 trim
// ==========================================

use crate::importer::error::ImportResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Default)]
pub struct InputSource {
    pub pasted: String,
    pub file_text: String,
    pub file_path: Option<PathBuf>,
}

impl InputSource {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pasted: text.into(),
            ..Default::default()
        }
    }

    /// 读入文件；读取失败时文件文本为空（记录告警）
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.file_text = match read_input_file(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "输入文件读取失败");
                String::new()
            }
        };
        self.file_path = Some(path.to_path_buf());
        self
    }

    /// 当前生效的原始输入（可能为空串）
    pub fn active_raw(&self) -> &str {
        let pasted = self.pasted.trim();
        if !pasted.is_empty() {
            return pasted;
        }
        self.file_text.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.active_raw().is_empty()
    }
}

/// 读取输入文件: 去掉 UTF-8 BOM，非法 UTF-8 字节按替换字符解码
pub fn read_input_file(path: &Path) -> ImportResult<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_string();
    debug!(path = %path.display(), bytes = bytes.len(), "输入文件已读取");
    Ok(text)
}
