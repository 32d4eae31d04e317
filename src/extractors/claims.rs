use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    core::error::AppError,
    dtos::auth::Claims,
    services::auth::authorize_token,
    state::AppState,
};

/// 从 `Authorization: Bearer` 中解析并校验访问令牌，角色按数据库当前状态刷新。
/// 黑名单检查由全局的 `auth_middleware` 完成。
impl FromRequestParts<AppState> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::AuthError("Missing or invalid Authorization header".to_string()))?;

        authorize_token(state, bearer.token()).await
    }
}

/// 需要当前用户 id 的处理器使用
pub fn current_user_id(claims: &Claims) -> Result<uuid::Uuid, AppError> {
    claims
        .user_id()
        .ok_or_else(|| AppError::AuthError("Invalid token subject".to_string()))
}
