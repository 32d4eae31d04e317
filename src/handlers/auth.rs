// src/handlers/auth.rs
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use validator::Validate;

use crate::{
    core::{constants::RECAPTCHA_ACTION_LOGIN, error::AppError},
    dtos::{
        auth::{
            ChangePasswordRequest, Claims, EmailRequest, LoginRequest, PasswordResetConfirmRequest,
            RefreshRequest, RegisterRequest, VerifyEmailRequest,
        },
        response::{ApiResponse, Res},
        user::UserProfile,
    },
    extractors::claims::current_user_id,
    rate_limit,
    services::auth as AuthService,
    state::AppState,
};

async fn register_account(
    state: &AppState,
    payload: RegisterRequest,
    staff_applicant: bool,
) -> Result<Res<UserProfile>, AppError> {
    payload.validate()?;

    // 每个邮箱每60秒最多注册5次
    rate_limit!(&state.redis, "register", &payload.email, 5, 60);

    let user = AuthService::register(state, payload, staff_applicant).await?;
    Ok(ApiResponse::created(user.into()))
}

/// 普通用户注册。账号创建后处于未验证状态，验证邮件在后台发送。
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register_account(&state, payload, false).await
}

/// 员工申请注册。角色仍是 User，只带申请标记，等管理员通过员工开关提升。
pub async fn register_staff(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    register_account(&state, payload, true).await
}

/// 用户登录处理器。
///
/// # 功能说明
/// - 校验请求格式
/// - 人机校验（action = `login`），未配置密钥时为旁路模式
/// - 按邮箱限流，防止暴力破解
/// - 返回访问令牌、刷新令牌以及生效角色
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    state
        .recaptcha
        .require(payload.recaptcha_token.as_deref(), RECAPTCHA_ACTION_LOGIN)
        .await?;

    // 每个邮箱每60秒最多登录5次
    rate_limit!(&state.redis, "login", &payload.email, 5, 60);

    let response = AuthService::login(&state, &payload.email, &payload.password).await?;
    Ok(ApiResponse::with_data(response))
}

/// 用刷新令牌换新的令牌对，旧刷新令牌随即作废。
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = AuthService::refresh(&state, payload.refresh_token).await?;
    Ok(ApiResponse::with_data(response))
}

/// 登出：访问令牌进黑名单，直到自然过期。
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<impl IntoResponse, AppError> {
    AuthService::logout(&state, bearer.token()).await?;
    Ok(ApiResponse::with_msg("Logged out successfully"))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    AuthService::verify_email(&state.db, payload.token.as_deref()).await?;
    Ok(ApiResponse::with_msg("Email verified successfully. You can now log in."))
}

/// 无论邮箱是否存在、是否已验证，都返回同样的 200。
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    rate_limit!(&state.redis, "resend_verification", &payload.email, 3, 60);

    AuthService::resend_verification(&state, &payload.email).await?;
    Ok(ApiResponse::with_msg(
        "If an unverified account exists with this email, a verification email will be sent.",
    ))
}

pub async fn change_password(
    claims: Claims,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = current_user_id(&claims)?;

    AuthService::change_password(&state.db, user_id, payload).await?;
    Ok(ApiResponse::with_msg("Password updated successfully."))
}

/// 申请重置密码。邮箱不存在时同样返回成功。
pub async fn password_reset(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // 每个邮箱每60秒最多申请3次
    rate_limit!(&state.redis, "password_reset", &payload.email, 3, 60);

    AuthService::request_password_reset(&state, &payload.email).await?;
    Ok(ApiResponse::with_msg("We have sent you a link to reset your password"))
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    AuthService::confirm_password_reset(&state.db, &state.config, payload).await?;
    Ok(ApiResponse::with_msg("Password reset success"))
}
