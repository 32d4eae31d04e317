use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;

use crate::{
    core::{
        constants::REDIS_PREFIX_BLACKLIST,
        enums::UserRole,
        error::AppError,
        policy::{self, MethodClass},
    },
    services::auth::authorize_token,
    state::AppState,
};

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// 请求者当前的生效角色（按数据库，不按令牌签发时）。
/// 没有令牌为 `None`；带了令牌但无效直接 401，不降级为匿名。
async fn actor_role(state: &AppState, token: Option<String>) -> Result<Option<UserRole>, AppError> {
    match token {
        None => Ok(None),
        Some(token) => Ok(Some(authorize_token(state, &token).await?.role())),
    }
}

/// 未登录返回 401，已登录但角色不够返回 403。
fn deny(actor: Option<UserRole>, req: &Request) -> AppError {
    match actor {
        None => AppError::AuthError("Authentication credentials were not provided.".to_string()),
        Some(role) => {
            tracing::warn!("🚫 {} {} denied for role {}", req.method(), req.uri().path(), role);
            AppError::Forbidden("You do not have permission to perform this action.".to_string())
        }
    }
}

/// 全局黑名单检查。没有令牌直接放行，由后续守卫或提取器决定是否需要登录。
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token_str) = bearer_token(&req) else {
        return Ok(next.run(req).await);
    };

    let redis_key = format!("{}{}", REDIS_PREFIX_BLACKLIST, token_str);
    let mut redis_conn = state.redis.clone();
    let is_blacklisted: bool = redis_conn.exists(&redis_key).await?;

    if is_blacklisted {
        tracing::warn!("🚫 Blocked blacklisted token");
        return Err(AppError::AuthError("Token has been revoked".to_string()));
    }

    Ok(next.run(req).await)
}

/// 仅管理员（用户管理）
pub async fn admin_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).map(str::to_owned);
    let actor = actor_role(&state, token).await?;
    if !policy::admin_only(actor) {
        return Err(deny(actor, &req));
    }
    Ok(next.run(req).await)
}

/// 读写都要求 Admin / Staff（联系表单后台、统计面板）
pub async fn operator_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).map(str::to_owned);
    let actor = actor_role(&state, token).await?;
    if !policy::operator_only(actor) {
        return Err(deny(actor, &req));
    }
    Ok(next.run(req).await)
}

/// 公开只读，写操作要求 Admin / Staff
pub async fn operator_or_read_only(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).map(str::to_owned);
    let actor = actor_role(&state, token).await?;
    if !policy::operator_or_read_only(actor, MethodClass::of(req.method())) {
        return Err(deny(actor, &req));
    }
    Ok(next.run(req).await)
}

/// 公开只读，写操作要求登录
pub async fn authenticated_or_read_only(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).map(str::to_owned);
    let actor = actor_role(&state, token).await?;
    if !policy::authenticated_or_read_only(actor, MethodClass::of(req.method())) {
        return Err(deny(actor, &req));
    }
    Ok(next.run(req).await)
}
