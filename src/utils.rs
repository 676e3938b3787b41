//! 通用辅助函数：
//! - 环境变量读取与解析
//! - URL / 主题色校验
//! - 由输入推导的默认值（短名称、占位图标字母、缓存名 slug）

use std::{env, path::PathBuf};

/// 短名称默认截取的字符数
pub(crate) const SHORT_NAME_LEN: usize = 12;

/// 应用名为空时占位图标使用的字母
pub(crate) const FALLBACK_INITIAL: &str = "P";

/// 可选读取 PATH 环境变量为 PathBuf。
pub(crate) fn env_opt_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// 可选读取 String 环境变量。
pub(crate) fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 读取布尔环境变量的真值（1/true/on/yes/y）。
pub(crate) fn env_bool_truthy(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| parse_truthy(&v))
}

fn parse_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes" | "y"
    )
}

/// URL 必须可解析且协议为 http/https。
pub(crate) fn is_valid_target_url(u: &str) -> bool {
    match url::Url::parse(u.trim()) {
        Ok(p) => matches!(p.scheme(), "http" | "https") && p.host_str().is_some(),
        Err(_) => false,
    }
}

/// 主题色必须是 `#` 加 6 位十六进制数字。
pub(crate) fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// 未显式指定短名称时，取应用名前 12 个字符。
pub(crate) fn derive_short_name(name: &str) -> String {
    name.chars().take(SHORT_NAME_LEN).collect()
}

/// 占位图标上的字母：应用名首字符的大写形式。
pub(crate) fn placeholder_initial(name: &str) -> String {
    match name.trim().chars().next() {
        Some(c) => c.to_uppercase().collect(),
        None => FALLBACK_INITIAL.to_string(),
    }
}

/// 由应用名生成缓存名：小写、非字母数字折叠为 `-`，并追加版本后缀 `-v1`。
pub(crate) fn cache_name(name: &str) -> String {
    let mut s = String::with_capacity(name.len());
    let mut prev_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            s.push(ch);
            prev_dash = false;
        } else if !prev_dash && !s.is_empty() {
            s.push('-');
            prev_dash = true;
        }
    }
    while s.ends_with('-') {
        s.pop();
    }
    if s.is_empty() {
        s.push_str("pwa");
    }
    format!("{}-v1", s)
}

/// 转义嵌入 SVG/XML 文本节点的字符。
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
