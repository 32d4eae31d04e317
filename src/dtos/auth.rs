use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::enums::UserRole;

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "crate::dtos::validate_password_strength")
    )]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
    pub recaptcha_token: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    /// 生效角色。未批准的 Staff 在这里是 "user"，数据库中的角色不变。
    pub role: String,
    pub exp: usize,
}

impl Claims {
    /// 无法识别的角色按普通用户处理
    pub fn role(&self) -> UserRole {
        UserRole::from_str(&self.role).unwrap_or(UserRole::User)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: UserRole,
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "crate::dtos::validate_password_strength")
    )]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, Validate)]
pub struct PasswordResetConfirmRequest {
    pub uid: String,
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = "crate::dtos::validate_password_strength")
    )]
    pub password: String,
    pub confirm_password: String,
}
