//! 授权策略：纯函数，只看 (角色, 是否已认证, 请求方法类别)，不访问任何状态。
//!
//! 未认证的请求以 `None` 表示角色。所有写接口都经过这里的判定，
//! 路由层通过 `middleware::auth` 中的守卫调用它们。

use axum::http::Method;
use uuid::Uuid;

use crate::core::enums::UserRole;

/// 请求方法类别。GET/HEAD/OPTIONS 为只读，其余一律视为写操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    ReadOnly,
    Mutating,
}

impl MethodClass {
    pub fn of(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
            MethodClass::ReadOnly
        } else {
            MethodClass::Mutating
        }
    }
}

/// 只读请求任何人都可以访问；写请求要求已登录且角色为 Admin 或 Staff。
pub fn operator_or_read_only(actor: Option<UserRole>, method: MethodClass) -> bool {
    match method {
        MethodClass::ReadOnly => true,
        MethodClass::Mutating => operator_only(actor),
    }
}

/// 更严格的版本：无论读写，都要求已登录的 Admin 或 Staff（如联系表单的后台查看）。
pub fn operator_only(actor: Option<UserRole>) -> bool {
    actor.is_some_and(UserRole::is_operator)
}

pub fn admin_only(actor: Option<UserRole>) -> bool {
    actor == Some(UserRole::Admin)
}

/// 评论区：任何人可读，登录用户可写。
pub fn authenticated_or_read_only(actor: Option<UserRole>, method: MethodClass) -> bool {
    method == MethodClass::ReadOnly || actor.is_some()
}

/// 评论只能由作者本人或管理员修改、删除。
pub fn can_modify_comment(actor_id: Uuid, actor_role: UserRole, owner_id: Uuid) -> bool {
    actor_id == owner_id || actor_role == UserRole::Admin
}
