// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const AVAILABLE_LOCALES: [&str; 2] = ["en", "zh-CN"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言；不支持的语言记录告警并保持不变
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) -> bool {
    if !AVAILABLE_LOCALES.contains(&locale) {
        tracing::warn!(locale, "不支持的界面语言，保持 {}", current_locale());
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use csv_import_plus::i18n::t;
/// let msg = t("delimiter.comma");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 按指定语言翻译（不改变全局语言）
pub fn t_in(locale: &str, key: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 翻译消息（带参数，占位符形如 `%{name}`）
///
/// # 示例
/// ```no_run
/// use csv_import_plus::i18n::t_with_args;
/// let msg = t_with_args("status.rows", &[("count", "12")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(t(key), args)
}

/// 按指定语言翻译（带参数）
pub fn t_in_with_args(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    fill_args(t_in(locale, key), args)
}

fn fill_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
