// ==========================================
// CSV Import+ - 指令解析器
// ==========================================
// 职责: 提取/剥离文本开头的 `#key: value` 注释指令块
// 规则:
// - 只扫描开头连续的注释块，空行跳过但不终止
// - 第一行非空且不以 `#` 开头的行终止扫描
// - 不匹配指令格式的注释行忽略，但不终止扫描
// ==========================================

use crate::domain::Directives;
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECTIVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*([A-Za-z0-9_\-]+)\s*:\s*(.+?)\s*$").unwrap());

/// 提取开头指令块中的指令
///
/// 键转小写；同一键重复出现时，后出现的值覆盖先出现的值
pub fn extract_directives(text: &str) -> Directives {
    let mut directives = Directives::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !line.trim_start().starts_with('#') {
            break;
        }
        if let Some(caps) = DIRECTIVE_PATTERN.captures(line) {
            directives.insert(&caps[1], caps[2].trim());
        }
    }
    directives
}

/// 剥离开头的注释/空行块，其后内容逐行原样保留（以 `\n` 重新连接）
pub fn strip_directive_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut skipping = true;
    for line in text.lines() {
        if skipping && line.trim().starts_with('#') {
            continue;
        }
        skipping = skipping && line.trim().is_empty();
        if !skipping {
            out.push(line);
        }
    }
    out.join("\n")
}
