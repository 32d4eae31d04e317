// src/services/user.rs
use std::str::FromStr;

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::{
    core::{
        constants::{CACHE_EXPIRE_USER_PROFILE, REDIS_PREFIX_USER_PROFILE},
        enums::UserRole,
        error::AppError,
    },
    dtos::{
        search_term,
        user::{UpdateUserRequest, UserListQuery, UserProfile},
    },
    entity::users,
    services::roles::{self, RoleState},
    state::AppState,
    utils::{cache, search::icontains},
};

fn profile_key(user_id: Uuid) -> String {
    format!("{}{}", REDIS_PREFIX_USER_PROFILE, user_id)
}

pub async fn load_user(db: &DatabaseConnection, id: Uuid) -> Result<users::Model, AppError> {
    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// 获取本人资料，缓存优先：命中直接返回，未命中查库后回填 Redis。
///
/// `user_id` 来自访问令牌的 `sub`。
pub async fn get_profile(state: &AppState, user_id: Uuid) -> Result<UserProfile, AppError> {
    let db = state.db.clone();
    cache::get_or_fetch(
        &state.redis,
        &profile_key(user_id),
        CACHE_EXPIRE_USER_PROFILE,
        || async move { Ok(load_user(&db, user_id).await?.into()) },
    )
    .await
}

/// 资料更新。`actor` 是发起请求的人，`target_id` 是被修改的账号，两者可以相同。
///
/// 请求里带了 `role` 时先过角色守卫；角色不再是 Staff 时清掉员工批准标记。
pub async fn update_user(
    db: &DatabaseConnection,
    actor_id: Uuid,
    target_id: Uuid,
    req: UpdateUserRequest,
) -> Result<users::Model, AppError> {
    let actor = load_user(db, actor_id).await?;
    let target = if actor_id == target_id {
        actor.clone()
    } else {
        load_user(db, target_id).await?
    };

    if let Some(role) = req.role {
        roles::check_role_change(&actor, &target, role)?;
    }

    let old_role = target.role;
    let mut model: users::ActiveModel = target.into();
    if let Some(v) = req.first_name {
        model.first_name = Set(v.trim().to_string());
    }
    if let Some(v) = req.last_name {
        model.last_name = Set(v.trim().to_string());
    }
    if let Some(v) = req.village_street {
        model.village_street = Set(Some(v));
    }
    if let Some(v) = req.upazilla {
        model.upazilla = Set(Some(v));
    }
    if let Some(v) = req.district {
        model.district = Set(Some(v));
    }
    if let Some(v) = req.division {
        model.division = Set(Some(v));
    }
    if let Some(v) = req.country {
        model.country = Set(Some(v));
    }
    if let Some(v) = req.mobile_number {
        model.mobile_number = Set(Some(v));
    }
    if let Some(v) = req.profile_picture {
        model.profile_picture = Set(Some(v));
    }
    if let Some(v) = req.is_staff_applicant {
        model.is_staff_applicant = Set(v);
    }
    if let Some(role) = req.role {
        if role != old_role {
            tracing::info!("🔑 {} changed role of {}: {} -> {}", actor.email, target_id, old_role, role);
        }
        model.role = Set(role);
        if role != UserRole::Staff {
            model.is_approved_staff = Set(false);
        }
    }
    model.updated_at = Set(Utc::now().fixed_offset());

    Ok(model.update(db).await?)
}

/// 更新本人资料，并同步写回缓存（Write-Through）。
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    req: UpdateUserRequest,
) -> Result<UserProfile, AppError> {
    let profile: UserProfile = update_user(&state.db, user_id, user_id, req).await?.into();
    cache::set(&state.redis, &profile_key(user_id), &profile, CACHE_EXPIRE_USER_PROFILE).await;
    Ok(profile)
}

// ---------- 管理员：用户管理 ----------

/// 只列出已验证邮箱的账号，新注册的在前。未知的 `role` 值返回空列表。
pub async fn list_users(db: &DatabaseConnection, query: UserListQuery) -> Result<Vec<UserProfile>, AppError> {
    let mut select = users::Entity::find().filter(users::Column::IsVerified.eq(true));

    if let Some(raw) = query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        match UserRole::from_str(raw) {
            Ok(role) => select = select.filter(users::Column::Role.eq(role)),
            Err(_) => return Ok(Vec::new()),
        }
    }

    if let Some(term) = search_term(&query.search) {
        select = select.filter(
            Condition::any()
                .add(icontains(users::Column::FirstName, term))
                .add(icontains(users::Column::LastName, term))
                .add(icontains(users::Column::Email, term))
                .add(icontains(users::Column::MobileNumber, term)),
        );
    }

    let users = select.order_by_desc(users::Column::CreatedAt).all(db).await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

pub async fn delete_user(db: &DatabaseConnection, actor_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    let actor = load_user(db, actor_id).await?;
    let target = if actor_id == target_id {
        actor.clone()
    } else {
        load_user(db, target_id).await?
    };
    roles::check_delete(&actor, &target)?;

    let result = users::Entity::delete_by_id(target_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    tracing::info!("🗑️ User {} deleted by {}", target_id, actor_id);
    Ok(())
}

/// 员工开关，状态流转见 `roles::next_staff_state`。
pub async fn toggle_staff(db: &DatabaseConnection, actor_id: Uuid, target_id: Uuid) -> Result<users::Model, AppError> {
    let actor = load_user(db, actor_id).await?;
    let target = load_user(db, target_id).await?;
    roles::check_toggle(&actor, &target)?;

    let next = roles::next_staff_state(RoleState::from(&target));
    tracing::info!(
        "🔁 {} toggled staff for {}: {}/{} -> {}/{}",
        actor.email,
        target.email,
        target.role,
        target.is_approved_staff,
        next.role,
        next.is_approved_staff
    );

    let mut model: users::ActiveModel = target.into();
    model.role = Set(next.role);
    model.is_approved_staff = Set(next.is_approved_staff);
    model.is_staff_applicant = Set(next.is_staff_applicant);
    model.updated_at = Set(Utc::now().fixed_offset());
    Ok(model.update(db).await?)
}

// 以下三个供管理接口调用：改动他人资料后让其缓存失效

pub async fn update_managed_user(
    state: &AppState,
    actor_id: Uuid,
    target_id: Uuid,
    req: UpdateUserRequest,
) -> Result<UserProfile, AppError> {
    let user = update_user(&state.db, actor_id, target_id, req).await?;
    cache::del(&state.redis, &profile_key(target_id)).await;
    Ok(user.into())
}

pub async fn delete_managed_user(state: &AppState, actor_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    delete_user(&state.db, actor_id, target_id).await?;
    cache::del(&state.redis, &profile_key(target_id)).await;
    Ok(())
}

pub async fn toggle_managed_staff(state: &AppState, actor_id: Uuid, target_id: Uuid) -> Result<UserProfile, AppError> {
    let user = toggle_staff(&state.db, actor_id, target_id).await?;
    cache::del(&state.redis, &profile_key(target_id)).await;
    Ok(user.into())
}
