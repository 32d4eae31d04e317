use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::error::AppError,
    dtos::{
        auth::Claims,
        response::Res,
        user::{UpdateUserRequest, UserListQuery, UserProfile},
    },
    extractors::claims::current_user_id,
    rate_limit,
    services::{dashboard as DashboardService, user as UserService},
    state::AppState,
};

/// 获取当前用户资料（缓存优先）。
///
/// 每个用户每分钟最多 60 次。
pub async fn get_me(
    claims: Claims,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    rate_limit!(&state.redis, "read_me", &claims.sub, 60, 60);

    let profile = UserService::get_profile(&state, current_user_id(&claims)?).await?;
    Ok(Res::with_data(profile))
}

/// 更新当前用户资料。带 `role` 时受角色守卫约束，本人不能改自己的角色。
pub async fn update_me(
    claims: Claims,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    rate_limit!(&state.redis, "update_me", &claims.sub, 10, 60);

    let profile = UserService::update_profile(&state, current_user_id(&claims)?, payload).await?;
    Ok(Res::with_data(profile))
}

// ---------- 管理员 ----------

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Res::with_data(UserService::list_users(&state.db, query).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user: UserProfile = UserService::load_user(&state.db, id).await?.into();
    Ok(Res::with_data(user))
}

pub async fn update_user(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let profile = UserService::update_managed_user(&state, current_user_id(&claims)?, id, payload).await?;
    Ok(Res::with_data(profile))
}

pub async fn delete_user(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    UserService::delete_managed_user(&state, current_user_id(&claims)?, id).await?;
    Ok(Res::deleted())
}

/// 员工开关：User → Staff（待批准）→ Staff（已批准）→ User
pub async fn toggle_staff(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let profile = UserService::toggle_managed_staff(&state, current_user_id(&claims)?, id).await?;
    Ok(Res::with_data(profile))
}

/// 运营面板统计。单项失败记为 0，接口本身不会因此失败。
pub async fn dashboard_stats(State(state): State<AppState>) -> impl IntoResponse {
    Res::with_data(DashboardService::stats(&state.db).await)
}
