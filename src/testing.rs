//! 测试辅助：内存 SQLite、常用种子数据、可记录投递的邮件通道和完整的 `AppState`。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::{
        config::Config,
        enums::{BookCategory, UserRole},
    },
    entity::{
        blog_posts, books, borrowed_books, carousel_items, comments, contact_messages,
        health_camps, members, notices, users,
    },
    services::{
        auth::hash_password,
        email::{EmailError, EmailMessage, EmailService, EmailTransport},
        recaptcha::{GateMode, RecaptchaGate},
    },
    state::AppState,
};

pub const PASSWORD: &str = "correct-horse-42";

/// 单连接的内存库：所有请求串行，表结构由实体生成。
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("sqlite");

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmts = vec![
        schema.create_table_from_entity(users::Entity),
        schema.create_table_from_entity(books::Entity),
        schema.create_table_from_entity(borrowed_books::Entity),
        schema.create_table_from_entity(blog_posts::Entity),
        schema.create_table_from_entity(comments::Entity),
        schema.create_table_from_entity(notices::Entity),
        schema.create_table_from_entity(members::Entity),
        schema.create_table_from_entity(carousel_items::Entity),
        schema.create_table_from_entity(contact_messages::Entity),
        schema.create_table_from_entity(health_camps::Entity),
    ];
    for stmt in stmts {
        db.execute(backend.build(&stmt)).await.expect("create table");
    }
    db
}

pub struct UserSeed {
    pub email: &'static str,
    pub role: UserRole,
    pub verified: bool,
    pub approved: bool,
    pub superuser: bool,
}

impl UserSeed {
    pub fn new(email: &'static str, role: UserRole) -> Self {
        Self {
            email,
            role,
            verified: true,
            approved: role == UserRole::Staff,
            superuser: false,
        }
    }

    pub fn unverified(mut self) -> Self {
        self.verified = false;
        self
    }

    pub fn pending(mut self) -> Self {
        self.approved = false;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.superuser = true;
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> users::Model {
        let now = Utc::now().fixed_offset();
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(self.email.to_string()),
            password_hash: Set(hash_password(PASSWORD).expect("hash")),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            village_street: Set(None),
            upazilla: Set(None),
            district: Set(None),
            division: Set(None),
            country: Set(None),
            mobile_number: Set(None),
            profile_picture: Set(None),
            role: Set(self.role),
            is_verified: Set(self.verified),
            is_approved_staff: Set(self.approved),
            is_staff_applicant: Set(false),
            is_superuser: Set(self.superuser),
            is_active: Set(true),
            email_verification_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("insert user")
    }
}

pub async fn seed_book(db: &DatabaseConnection, serial: &str, quantity: i32) -> books::Model {
    let now = Utc::now().fixed_offset();
    books::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(format!("Book {}", serial)),
        bengali_title: Set(None),
        author: Set("Rabindranath Tagore".into()),
        category: Set(BookCategory::Poetry),
        serial_number: Set(serial.to_string()),
        description: Set(String::new()),
        cover_image: Set(None),
        is_available: Set(quantity > 0),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert book")
}

/// 记录所有投递的邮件
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 等待后台任务投递，最多约一秒
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(EmailError::SendFailed("relay down".into()));
        }
        Ok(())
    }
}

pub fn recording_email(enabled: bool, transport: Arc<RecordingTransport>) -> EmailService {
    EmailService::new(
        enabled,
        "no-reply@example.org".into(),
        "http://localhost:5173".into(),
        transport,
    )
}

/// reCAPTCHA 处于跳过模式的完整状态。
/// Redis 是惰性连接：只在真正发出命令时才会去连，不走 Redis 的路径可以直接测试。
pub fn test_state(db: DatabaseConnection, email: EmailService) -> AppState {
    let client = redis::Client::open("redis://127.0.0.1:6379/").expect("redis url");
    let redis = ConnectionManager::new_lazy_with_config(client, ConnectionManagerConfig::new())
        .expect("redis manager");
    let recaptcha = RecaptchaGate::new(GateMode::Bypass).expect("recaptcha gate");
    AppState::new(db, redis, Config::for_tests(), email, recaptcha)
}
