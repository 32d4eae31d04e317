use config::{Config as ConfigLoader, Environment};
use dotenvy::dotenv;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::core::constants::{RECAPTCHA_DEFAULT_MIN_SCORE, RECAPTCHA_DEFAULT_VERIFY_URL};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Postgres 连接串（敏感信息）
    #[serde(alias = "DATABASE_URL")]
    pub database_url: SecretString,

    /// Redis 连接串（敏感信息）
    #[serde(alias = "REDIS_URL")]
    pub redis_url: SecretString,

    /// JWT 签名密钥，同时用于密码重置令牌的 HMAC（敏感信息）
    #[serde(alias = "JWT_SECRET")]
    pub jwt_secret: SecretString,

    #[serde(default = "default_port", alias = "SERVER_PORT")]
    pub server_port: u16,

    #[serde(default = "default_host", alias = "SERVER_HOST")]
    pub server_host: String,

    #[serde(default = "default_log", alias = "RUST_LOG")]
    pub rust_log: String,

    #[serde(default = "default_log_dir", alias = "LOG_DIR")]
    pub log_dir: String,

    #[serde(default = "default_jwt_exp", alias = "JWT_EXPIRATION")]
    pub jwt_expiration: i64,

    #[serde(default = "default_refresh_exp", alias = "REFRESH_TOKEN_EXPIRATION")]
    pub refresh_token_expiration: i64,

    #[serde(default = "default_reset_exp", alias = "PASSWORD_RESET_EXPIRATION")]
    pub password_reset_expiration: i64,

    /// 邮件中的验证/重置链接指向的前端地址
    #[serde(default = "default_frontend_url", alias = "FRONTEND_URL")]
    pub frontend_url: String,

    /// reCAPTCHA 服务端密钥。未设置（或为空）时跳过人机校验，仅限开发环境！
    #[serde(default, alias = "RECAPTCHA_SECRET_KEY")]
    pub recaptcha_secret_key: Option<SecretString>,

    #[serde(default = "default_recaptcha_url", alias = "RECAPTCHA_VERIFY_URL")]
    pub recaptcha_verify_url: String,

    #[serde(default = "default_recaptcha_score", alias = "RECAPTCHA_MIN_SCORE")]
    pub recaptcha_min_score: f64,

    #[serde(default = "default_true", alias = "EMAIL_ENABLED")]
    pub email_enabled: bool,

    /// `console` 或 `relay`
    #[serde(default = "default_email_provider", alias = "EMAIL_PROVIDER")]
    pub email_provider: String,

    #[serde(default, alias = "EMAIL_RELAY_URL")]
    pub email_relay_url: Option<String>,

    #[serde(default = "default_from_email", alias = "DEFAULT_FROM_EMAIL")]
    pub default_from_email: String,

    /// 启动时创建的超级管理员（可选）
    #[serde(default, alias = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[serde(default, alias = "ADMIN_PASSWORD")]
    pub admin_password: Option<SecretString>,
}

impl Config {
    /// 加载配置：
    /// - 支持 `.env`
    /// - 优先从环境变量加载
    pub fn new() -> Self {
        dotenv().ok();

        // 注意：try_parsing(true) 会把 "3000" 解析成数字、"false" 解析成布尔值。
        let builder = ConfigLoader::builder().add_source(Environment::default().try_parsing(true));

        match builder.build() {
            Ok(config) => config
                .try_deserialize()
                .expect("❌ Failed to deserialize configuration"),
            Err(e) => panic!("❌ Failed to build configuration: {e}"),
        }
    }

    /// 返回非空的 reCAPTCHA 密钥。空字符串与未设置同样视为“未配置”。
    pub fn recaptcha_secret(&self) -> Option<&SecretString> {
        self.recaptcha_secret_key
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())
    }
}

// --- 默认值函数 ---
fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_log() -> String {
    "info".to_string()
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_jwt_exp() -> i64 {
    3600
} // 1 hour
fn default_refresh_exp() -> i64 {
    86400 * 7
} // 7 days
fn default_reset_exp() -> i64 {
    86400 * 3
} // 3 days
fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}
fn default_recaptcha_url() -> String {
    RECAPTCHA_DEFAULT_VERIFY_URL.to_string()
}
fn default_recaptcha_score() -> f64 {
    RECAPTCHA_DEFAULT_MIN_SCORE
}
fn default_true() -> bool {
    true
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_from_email() -> String {
    "no-reply@ksfoundation.org".to_string()
}

#[cfg(test)]
impl Config {
    /// 测试用配置：不读取环境变量，reCAPTCHA 处于跳过模式，邮件关闭。
    pub fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("sqlite::memory:"),
            redis_url: SecretString::from("redis://127.0.0.1/"),
            jwt_secret: SecretString::from("test-secret-for-unit-tests"),
            server_port: default_port(),
            server_host: default_host(),
            rust_log: default_log(),
            log_dir: default_log_dir(),
            jwt_expiration: default_jwt_exp(),
            refresh_token_expiration: default_refresh_exp(),
            password_reset_expiration: default_reset_exp(),
            frontend_url: default_frontend_url(),
            recaptcha_secret_key: None,
            recaptcha_verify_url: default_recaptcha_url(),
            recaptcha_min_score: default_recaptcha_score(),
            email_enabled: false,
            email_provider: default_email_provider(),
            email_relay_url: None,
            default_from_email: default_from_email(),
            admin_email: None,
            admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_recaptcha_secret_counts_as_unset() {
        let mut config = Config::for_tests();
        assert!(config.recaptcha_secret().is_none());

        config.recaptcha_secret_key = Some(SecretString::from("   "));
        assert!(config.recaptcha_secret().is_none());

        config.recaptcha_secret_key = Some(SecretString::from("6Lc-secret"));
        assert_eq!(config.recaptcha_secret().map(|s| s.expose_secret()), Some("6Lc-secret"));
    }
}
