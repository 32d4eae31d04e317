use std::sync::Arc;

use redis::aio::ConnectionManager;
use sea_orm::DatabaseConnection;

use crate::{
    core::config::Config,
    services::{email::EmailService, recaptcha::RecaptchaGate},
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: ConnectionManager,
    /// 全局配置，使用 Arc 包装以实现廉价克隆
    pub config: Arc<Config>,
    pub email: EmailService,
    pub recaptcha: RecaptchaGate,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        redis: ConnectionManager,
        config: Config,
        email: EmailService,
        recaptcha: RecaptchaGate,
    ) -> Self {
        Self {
            db,
            redis,
            config: Arc::new(config),
            email,
            recaptcha,
        }
    }
}
