// src/core/error.rs
use std::collections::BTreeMap;

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

use crate::dtos::response::ApiResponse;

/// 应用程序统一错误类型。覆盖数据库、缓存、校验、认证、授权、令牌等各层错误。
///
/// 实现了 `IntoResponse`，处理器直接返回 `Result<_, AppError>` 即可，
/// 错误统一以 `ApiResponse` 信封返回，字段级错误放在 `data` 中。
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// validator 产生的校验错误，按字段返回。
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// 单个字段的业务校验错误，如两次密码不一致、人机校验失败。返回400。
    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },

    /// 邮箱验证令牌或密码重置令牌无效/过期。返回400。
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// 认证错误。如令牌无效、邮箱密码错误、邮箱未验证。返回401。
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// 授权错误。角色或归属检查未通过。返回403。
    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// 资源冲突。如重复归还、无可借副本、编号重复。返回409。
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Invalid { field, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_)
            | AppError::RedisError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) | AppError::Invalid { .. } | AppError::InvalidToken(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// validator 的错误展开成 `字段 -> [消息]`。
fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 内部错误只返回通用消息，详细信息写日志，避免泄露敏感信息。
        let msg = match &self {
            AppError::DatabaseError(e) => {
                tracing::error!("❌ Database Error: {}", e);
                "Database service error".to_string()
            }
            AppError::RedisError(e) => {
                tracing::error!("❌ Redis Error: {}", e);
                "Cache service error".to_string()
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("❌ Internal Error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::ValidationError(_) => "Validation failed".to_string(),
            AppError::Invalid { message, .. } => message.clone(),
            AppError::InvalidToken(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::RateLimitExceeded(msg) => msg.clone(),
        };

        match self {
            AppError::ValidationError(e) => {
                ApiResponse::with_code(status, &msg, Some(field_messages(&e))).into_response()
            }
            AppError::Invalid { field, message } => {
                let data = BTreeMap::from([(field.to_string(), vec![message])]);
                ApiResponse::with_code(status, &msg, Some(data)).into_response()
            }
            _ => ApiResponse::<()>::with_error(status, &msg).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn field_error_is_scoped_under_its_field() {
        let resp = AppError::invalid("recaptcha", "No reCAPTCHA token provided").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["data"]["recaptcha"][0], "No reCAPTCHA token provided");
    }

    #[tokio::test]
    async fn validator_errors_are_grouped_by_field() {
        #[derive(Validate)]
        struct SignupForm {
            #[validate(email(message = "Enter a valid email address."))]
            email: String,
        }

        let err = SignupForm { email: "nope".into() }.validate().unwrap_err();
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = body_json(resp).await;
        assert_eq!(body["data"]["email"][0], "Enter a valid email address.");
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let resp = AppError::InternalServerError("pool exhausted".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["msg"], "Internal server error");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidToken("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::AuthError("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }
}
