use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::ValidationError;

pub mod auth;
pub mod blog;
pub mod content;
pub mod dashboard;
pub mod library;
pub mod response;
pub mod user;

/// 手机号：可带 + 号，6~15 位数字
pub static MOBILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9]{6,15}$").expect("Invalid Regex")
});

/// 密码不能全是数字（长度由 `length` 规则单独检查）。
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("password_entirely_numeric");
        err.message = Some("This password is entirely numeric.".into());
        return Err(err);
    }
    Ok(())
}

/// 列表接口通用的 `?search=` 参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// 去掉首尾空白后为空的搜索词视为未提供
pub fn search_term(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_passwords_are_rejected() {
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("1234abcd").is_ok());
    }

    #[test]
    fn mobile_numbers() {
        assert!(MOBILE_REGEX.is_match("+8801712345678"));
        assert!(MOBILE_REGEX.is_match("01712345678"));
        assert!(!MOBILE_REGEX.is_match("017-1234"));
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(&Some("  ".into())), None);
        assert_eq!(search_term(&Some(" tagore ".into())), Some("tagore"));
        assert_eq!(search_term(&None), None);
    }
}
