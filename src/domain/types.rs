// ==========================================
// CSV Import+ - 领域类型定义
// ==========================================
// 职责: 分隔符 / 分隔符模式等基础值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 分隔符 (Delimiter)
// ==========================================
// 自动检测只在四个候选之间选择；Other 仅来自用户显式指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,     // ,
    Tab,       // \t
    Semicolon, // ;
    Pipe,      // |
    Other(u8), // 用户指定的单字节 ASCII 分隔符
}

impl Delimiter {
    /// 自动检测的候选集（顺序即同分时的优先顺序）
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Tab,
        Delimiter::Semicolon,
        Delimiter::Pipe,
    ];

    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Semicolon => b';',
            Delimiter::Pipe => b'|',
            Delimiter::Other(b) => *b,
        }
    }

    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }

    /// 从字符构造（非 ASCII 或换行/引号字符返回 None）
    pub fn from_char(c: char) -> Option<Self> {
        if !c.is_ascii() || c == '\n' || c == '\r' || c == '"' {
            return None;
        }
        Some(match c {
            ',' => Delimiter::Comma,
            '\t' => Delimiter::Tab,
            ';' => Delimiter::Semicolon,
            '|' => Delimiter::Pipe,
            other => Delimiter::Other(other as u8),
        })
    }

    /// 面向用户的显示名称（已本地化）
    pub fn display_name(&self) -> String {
        match self {
            Delimiter::Comma => crate::i18n::t("delimiter.comma"),
            Delimiter::Tab => crate::i18n::t("delimiter.tab"),
            Delimiter::Semicolon => crate::i18n::t("delimiter.semicolon"),
            Delimiter::Pipe => crate::i18n::t("delimiter.pipe"),
            Delimiter::Other(b) => format!("'{}'", *b as char),
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Comma
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Semicolon => write!(f, "semicolon"),
            Delimiter::Pipe => write!(f, "pipe"),
            Delimiter::Other(b) => write!(f, "{}", *b as char),
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "tab" | "\\t" => Ok(Delimiter::Tab),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "pipe" | "|" => Ok(Delimiter::Pipe),
            _ => {
                // "\t" 原样传入时 trim 会吃掉，单独处理
                if s == "\t" {
                    return Ok(Delimiter::Tab);
                }
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        Delimiter::from_char(c).ok_or_else(|| format!("不支持的分隔符: {:?}", s))
                    }
                    _ => Err(format!("不支持的分隔符: {:?}", s)),
                }
            }
        }
    }
}

// ==========================================
// 分隔符模式 (Delimiter Mode)
// ==========================================
// Auto: 每次导入/内容变更时重新检测，不缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterMode {
    #[default]
    Auto,
    Fixed(Delimiter),
}

impl DelimiterMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, DelimiterMode::Auto)
    }
}

impl fmt::Display for DelimiterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelimiterMode::Auto => write!(f, "auto"),
            DelimiterMode::Fixed(d) => write!(f, "{}", d),
        }
    }
}

impl FromStr for DelimiterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "\t" {
            return Ok(DelimiterMode::Fixed(Delimiter::Tab));
        }
        match s.trim().to_lowercase().as_str() {
            "auto" | "auto-detect" | "" => Ok(DelimiterMode::Auto),
            _ => s.parse::<Delimiter>().map(DelimiterMode::Fixed),
        }
    }
}
