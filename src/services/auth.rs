use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use redis::AsyncCommands;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use secrecy::ExposeSecret;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    core::{
        config::Config,
        constants::*,
        enums::UserRole,
        error::AppError,
    },
    dtos::auth::{
        ChangePasswordRequest, Claims, LoginResponse, PasswordResetConfirmRequest,
        RegisterRequest,
    },
    entity::users,
    services::roles::effective_role,
    state::AppState,
    utils::limiter::check_rate_limit,
};

type HmacSha256 = Hmac<Sha256>;

// --- 辅助函数 ---
#[inline]
fn refresh_key(token: &str) -> String {
    format!("{}{}", REDIS_PREFIX_REFRESH, token)
}
#[inline]
fn blacklist_key(token: &str) -> String {
    format!("{}{}", REDIS_PREFIX_BLACKLIST, token)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 + 随机盐
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(format!("Hash failed: {}", e)))?
        .to_string())
}

fn password_matches(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::InternalServerError("Stored password hash is malformed".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 邮箱验证令牌：64 位字母数字，来自操作系统 CSPRNG。
pub fn generate_verification_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// 生成访问令牌。`role` 是生效角色，可能低于数据库中的角色。
fn generate_access_token(config: &Config, user: &users::Model, role: UserRole) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::seconds(config.jwt_expiration)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token generation failed: {}", e)))
}

/// 校验访问令牌的签名与有效期
pub fn decode_access_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("⚠️ Token validation failed: {}", e);
            AppError::AuthError("Invalid or expired token".to_string())
        })
}

/// 令牌里的角色以签发时为准；这里按数据库当前状态改写。
/// 账号已删除返回 401，已停用返回 403。
pub async fn refresh_claims(db: &DatabaseConnection, mut claims: Claims) -> Result<Claims, AppError> {
    let uid = claims
        .user_id()
        .ok_or_else(|| AppError::AuthError("Invalid token subject".to_string()))?;
    let user = users::Entity::find_by_id(uid)
        .one(db)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("User inactive".to_string()));
    }

    let role = effective_role(&user);
    if claims.role() != role {
        tracing::info!("🔄 Role of {} changed since token was issued: {} -> {}", user.email, claims.role, role);
        claims.role = role.to_string();
    }
    Ok(claims)
}

/// 校验签名后再按数据库刷新角色，守卫与 `Claims` 提取器共用。
pub async fn authorize_token(state: &AppState, token: &str) -> Result<Claims, AppError> {
    let claims = decode_access_token(&state.config, token)?;
    refresh_claims(&state.db, claims).await
}

fn new_user(email: String, password_hash: String, first_name: String, last_name: String) -> users::ActiveModel {
    let now = Utc::now().fixed_offset();
    users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(first_name),
        last_name: Set(last_name),
        village_street: Set(None),
        upazilla: Set(None),
        district: Set(None),
        division: Set(None),
        country: Set(None),
        mobile_number: Set(None),
        profile_picture: Set(None),
        role: Set(UserRole::User),
        is_verified: Set(false),
        is_approved_staff: Set(false),
        is_staff_applicant: Set(false),
        is_superuser: Set(false),
        is_active: Set(true),
        email_verification_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn map_unique_violation(e: DbErr, msg: &str) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(msg.to_string()),
        _ => AppError::DatabaseError(e),
    }
}

// --- 注册与邮箱验证 ---

/// 创建未验证账号。员工申请同样以 User 角色创建，只多一个申请标记，
/// 由管理员通过员工开关提升。
pub async fn create_account(
    db: &DatabaseConnection,
    req: RegisterRequest,
    staff_applicant: bool,
) -> Result<users::Model, AppError> {
    let email = normalize_email(&req.email);

    let exists = users::Entity::find()
        .filter(users::Column::Email.eq(&email))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict("A user with that email already exists.".to_string()));
    }

    let mut model = new_user(
        email,
        hash_password(&req.password)?,
        req.first_name.trim().to_string(),
        req.last_name.trim().to_string(),
    );
    model.is_staff_applicant = Set(staff_applicant);
    model.email_verification_token = Set(Some(generate_verification_token()));

    model
        .insert(db)
        .await
        .map_err(|e| map_unique_violation(e, "A user with that email already exists."))
}

/// 注册并在后台发送验证邮件
pub async fn register(
    state: &AppState,
    req: RegisterRequest,
    staff_applicant: bool,
) -> Result<users::Model, AppError> {
    let user = create_account(&state.db, req, staff_applicant).await?;

    if let Some(token) = &user.email_verification_token {
        state
            .email
            .spawn_send(state.email.verification_email(&user.email, token));
    }
    tracing::info!("👤 New {} registered: {}", if staff_applicant { "staff applicant" } else { "user" }, user.email);
    Ok(user)
}

/// 消费验证令牌。条件更新保证同一令牌只能成功一次。
pub async fn verify_email(db: &DatabaseConnection, token: Option<&str>) -> Result<(), AppError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidToken("No verification token provided.".to_string()))?;

    let result = users::Entity::update_many()
        .col_expr(users::Column::IsVerified, Expr::value(true))
        .col_expr(users::Column::EmailVerificationToken, Expr::value(Option::<String>::None))
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(users::Column::EmailVerificationToken.eq(token))
        .filter(users::Column::IsVerified.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InvalidToken("Invalid or expired verification token.".to_string()));
    }
    Ok(())
}

/// 为未验证账号换发令牌。账号不存在或已验证时返回 None。
pub async fn rotate_verification_token(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, AppError> {
    let Some(user) = users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .filter(users::Column::IsVerified.eq(false))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let mut active: users::ActiveModel = user.into();
    active.email_verification_token = Set(Some(generate_verification_token()));
    active.updated_at = Set(Utc::now().fixed_offset());
    Ok(Some(active.update(db).await?))
}

/// 重发验证邮件。无论账号是否存在都返回成功，不泄露注册信息。
pub async fn resend_verification(state: &AppState, email: &str) -> Result<(), AppError> {
    if let Some(user) = rotate_verification_token(&state.db, email).await? {
        if let Some(token) = &user.email_verification_token {
            state
                .email
                .spawn_send(state.email.verification_email(&user.email, token));
        }
    }
    Ok(())
}

// --- 登录与令牌 ---

/// 校验凭证。密码错误与邮箱未验证都返回 401。
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<users::Model, AppError> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !password_matches(password, &user.password_hash)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    if !user.is_verified {
        return Err(AppError::AuthError(
            "Email is not verified. Please check your inbox.".to_string(),
        ));
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    Ok(user)
}

async fn issue_tokens(state: &AppState, user: &users::Model) -> Result<LoginResponse, AppError> {
    let role = effective_role(user);
    let access_token = generate_access_token(&state.config, user, role)?;
    let refresh_token = Uuid::new_v4().to_string();

    let mut redis = state.redis.clone();
    let _: () = redis
        .set_ex(
            refresh_key(&refresh_token),
            user.id.to_string(),
            state.config.refresh_token_expiration as u64,
        )
        .await?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        role,
        user_id: user.id,
        email: user.email.clone(),
    })
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<LoginResponse, AppError> {
    let user = authenticate(&state.db, email, password).await?;
    if effective_role(&user) != user.role {
        tracing::info!("🔒 Staff {} is not approved yet, issuing user-level token", user.email);
    }
    issue_tokens(state, &user).await
}

/// 刷新令牌轮换：旧令牌标记为 USED，宽限期后过期；重复使用视为泄露。
pub async fn refresh(state: &AppState, old_token: String) -> Result<LoginResponse, AppError> {
    let redis_key_old = refresh_key(&old_token);
    let mut redis = state.redis.clone();

    let user_id_raw: Option<String> = redis.get(&redis_key_old).await?;
    let user_id_raw =
        user_id_raw.ok_or_else(|| AppError::AuthError("Invalid or expired refresh token".to_string()))?;

    let (user_id, is_used) = match user_id_raw.strip_prefix(REDIS_PREFIX_USED) {
        Some(stripped) => (stripped, true),
        None => (user_id_raw.as_str(), false),
    };

    check_rate_limit(&state.redis, "refresh_token", user_id, 10, 60).await?;

    if is_used {
        tracing::warn!("🚨 Refresh token reused! User: {}", user_id);
        return Err(AppError::Conflict("Token reused. Please login again.".to_string()));
    }

    let uid = Uuid::parse_str(user_id)
        .map_err(|_| AppError::InternalServerError("Malformed user id in refresh token".to_string()))?;
    let user = users::Entity::find_by_id(uid)
        .one(&state.db)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("User inactive".to_string()));
    }

    let used_val = format!("{}{}", REDIS_PREFIX_USED, user_id);
    let _: () = redis.set_ex(&redis_key_old, used_val, ROTATION_GRACE_PERIOD).await?;

    issue_tokens(state, &user).await
}

/// 登出：把访问令牌加入黑名单直到它自然过期。无效令牌直接忽略。
pub async fn logout(state: &AppState, token: &str) -> Result<(), AppError> {
    if let Ok(claims) = decode_access_token(&state.config, token) {
        let ttl = claims.exp as i64 - Utc::now().timestamp();
        if ttl > 0 {
            let mut redis = state.redis.clone();
            let _: () = redis.set_ex(blacklist_key(token), "logout", ttl as u64).await?;
        }
    }
    Ok(())
}

// --- 修改与重置密码 ---

pub async fn change_password(
    db: &DatabaseConnection,
    user_id: Uuid,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    if req.new_password != req.confirm_password {
        return Err(AppError::invalid("confirm_password", "Password fields didn't match."));
    }

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if !password_matches(&req.old_password, &user.password_hash)? {
        return Err(AppError::invalid("old_password", "Old password is not correct"));
    }

    set_password(db, user, &req.new_password).await
}

async fn set_password(db: &DatabaseConnection, user: users::Model, password: &str) -> Result<(), AppError> {
    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(hash_password(password)?);
    active.updated_at = Set(Utc::now().fixed_offset());
    active.update(db).await?;
    Ok(())
}

fn reset_signature(secret: &[u8], user: &users::Model, issued: i64) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::InternalServerError(format!("HMAC init failed: {}", e)))?;
    mac.update(format!("{}:{}:{}", user.id, user.password_hash, issued).as_bytes());
    Ok(mac)
}

/// 重置令牌：`签发时间.HMAC`。签名覆盖当前密码哈希，密码一改旧令牌即失效。
pub fn make_reset_token(secret: &[u8], user: &users::Model, issued: i64) -> Result<String, AppError> {
    let mac = reset_signature(secret, user, issued)?;
    Ok(format!("{}.{}", issued, hex::encode(mac.finalize().into_bytes())))
}

pub fn check_reset_token(secret: &[u8], user: &users::Model, token: &str, now: i64, ttl: i64) -> bool {
    let Some((issued, signature)) = token.split_once('.') else {
        return false;
    };
    let Ok(issued) = issued.parse::<i64>() else {
        return false;
    };
    if issued > now || now - issued > ttl {
        return false;
    }
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    match reset_signature(secret, user, issued) {
        Ok(mac) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

/// 发送重置邮件。邮箱不存在时同样返回成功。
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), AppError> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(&state.db)
        .await?;

    if let Some(user) = user {
        let token = make_reset_token(
            state.config.jwt_secret.expose_secret().as_bytes(),
            &user,
            Utc::now().timestamp(),
        )?;
        state.email.spawn_send(
            state
                .email
                .password_reset_email(&user.email, &user.id.to_string(), &token),
        );
        tracing::info!("🔑 Password reset requested for {}", user.email);
    }
    Ok(())
}

pub async fn confirm_password_reset(
    db: &DatabaseConnection,
    config: &Config,
    req: PasswordResetConfirmRequest,
) -> Result<(), AppError> {
    if req.password != req.confirm_password {
        return Err(AppError::invalid("confirm_password", "Password fields didn't match."));
    }

    let invalid = || AppError::InvalidToken("Token is invalid or expired".to_string());

    let uid = Uuid::parse_str(req.uid.trim()).map_err(|_| invalid())?;
    let user = users::Entity::find_by_id(uid).one(db).await?.ok_or_else(invalid)?;

    let valid = check_reset_token(
        config.jwt_secret.expose_secret().as_bytes(),
        &user,
        &req.token,
        Utc::now().timestamp(),
        config.password_reset_expiration,
    );
    if !valid {
        tracing::warn!("⚠️ Rejected password reset token for {}", user.email);
        return Err(invalid());
    }

    set_password(db, user, &req.password).await
}

// --- 启动引导 ---

/// 配置了 ADMIN_EMAIL / ADMIN_PASSWORD 且账号不存在时，创建已验证的超级管理员。
pub async fn bootstrap_admin(db: &DatabaseConnection, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = normalize_email(email);
    if email.is_empty() || password.expose_secret().is_empty() {
        return Ok(());
    }

    let exists = users::Entity::find()
        .filter(users::Column::Email.eq(&email))
        .one(db)
        .await?
        .is_some();
    if exists {
        tracing::debug!("Admin account {} already exists", email);
        return Ok(());
    }

    let mut model = new_user(
        email.clone(),
        hash_password(password.expose_secret())?,
        String::new(),
        String::new(),
    );
    model.role = Set(UserRole::Admin);
    model.is_verified = Set(true);
    model.is_superuser = Set(true);
    model.insert(db).await?;

    tracing::info!("👑 Bootstrap superuser created: {}", email);
    Ok(())
}
