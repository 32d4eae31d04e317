//! 角色状态机：员工开关、资料更新时的角色守卫、登录时的生效角色。
//! 全部是纯函数，数据库读写由 `services::user` 负责。

use crate::{
    core::{enums::UserRole, error::AppError},
    entity::users,
};

/// 与角色相关的三个持久化字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleState {
    pub role: UserRole,
    pub is_approved_staff: bool,
    pub is_staff_applicant: bool,
}

impl From<&users::Model> for RoleState {
    fn from(user: &users::Model) -> Self {
        Self {
            role: user.role,
            is_approved_staff: user.is_approved_staff,
            is_staff_applicant: user.is_staff_applicant,
        }
    }
}

/// 员工开关的下一个状态：
/// User → Staff（待批准）→ Staff（已批准）→ User。
/// Admin 只有超级管理员能动，降为已批准的 Staff。
pub fn next_staff_state(current: RoleState) -> RoleState {
    match (current.role, current.is_approved_staff) {
        (UserRole::User, _) => RoleState {
            role: UserRole::Staff,
            is_approved_staff: false,
            is_staff_applicant: false,
        },
        (UserRole::Staff, false) => RoleState {
            role: UserRole::Staff,
            is_approved_staff: true,
            is_staff_applicant: false,
        },
        (UserRole::Staff, true) => RoleState {
            role: UserRole::User,
            is_approved_staff: false,
            is_staff_applicant: false,
        },
        (UserRole::Admin, _) => RoleState {
            role: UserRole::Staff,
            is_approved_staff: true,
            is_staff_applicant: false,
        },
    }
}

/// 员工开关的前置检查
pub fn check_toggle(actor: &users::Model, target: &users::Model) -> Result<(), AppError> {
    if actor.id == target.id {
        return Err(AppError::invalid("role", "You cannot change your own role."));
    }
    if target.role == UserRole::Admin && !actor.is_superuser {
        tracing::warn!("🚫 {} tried to toggle administrator {}", actor.email, target.email);
        return Err(AppError::Forbidden(
            "Cannot change the role of an Administrator".to_string(),
        ));
    }
    Ok(())
}

/// 删除账号的前置检查：不能删自己，管理员账号只有超级管理员能删。
pub fn check_delete(actor: &users::Model, target: &users::Model) -> Result<(), AppError> {
    if actor.id == target.id {
        return Err(AppError::invalid("user", "Cannot delete your own account."));
    }
    if target.role == UserRole::Admin && !actor.is_superuser {
        tracing::warn!("🚫 {} tried to delete administrator {}", actor.email, target.email);
        return Err(AppError::Forbidden(
            "Only Superusers can delete an Administrator.".to_string(),
        ));
    }
    Ok(())
}

/// 资料更新时的角色守卫。角色未变化时直接通过。
pub fn check_role_change(
    actor: &users::Model,
    target: &users::Model,
    new_role: UserRole,
) -> Result<(), AppError> {
    if new_role == target.role {
        return Ok(());
    }
    if actor.id == target.id {
        return Err(AppError::invalid("role", "You cannot change your own role."));
    }
    if target.role == UserRole::Admin && !actor.is_superuser {
        tracing::warn!("🚫 {} tried to demote administrator {}", actor.email, target.email);
        return Err(AppError::Forbidden(
            "You cannot change the role of an Administrator.".to_string(),
        ));
    }
    if new_role == UserRole::Admin && !actor.is_superuser {
        tracing::warn!("🚫 {} tried to promote {} to administrator", actor.email, target.email);
        return Err(AppError::Forbidden(
            "Only Superusers can promote users to Administrator.".to_string(),
        ));
    }
    Ok(())
}

/// 写入令牌的生效角色：未批准的 Staff 只拿到 User 权限，数据库中的角色不变。
pub fn effective_role(user: &users::Model) -> UserRole {
    match user.role {
        UserRole::Staff if !user.is_approved_staff => UserRole::User,
        role => role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> users::Model {
        let now = Utc::now().fixed_offset();
        users::Model {
            id: Uuid::new_v4(),
            email: format!("{}@example.org", Uuid::new_v4()),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            village_street: None,
            upazilla: None,
            district: None,
            division: None,
            country: None,
            mobile_number: None,
            profile_picture: None,
            role,
            is_verified: true,
            is_approved_staff: false,
            is_staff_applicant: false,
            is_superuser: false,
            is_active: true,
            email_verification_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn toggle_cycles_user_pending_approved_user() {
        let start = RoleState {
            role: UserRole::User,
            is_approved_staff: false,
            is_staff_applicant: true,
        };
        let pending = next_staff_state(start);
        assert_eq!(pending.role, UserRole::Staff);
        assert!(!pending.is_approved_staff);
        assert!(!pending.is_staff_applicant);

        let approved = next_staff_state(pending);
        assert_eq!(approved.role, UserRole::Staff);
        assert!(approved.is_approved_staff);

        let back = next_staff_state(approved);
        assert_eq!(back.role, UserRole::User);
        assert!(!back.is_approved_staff);
    }

    #[test]
    fn nobody_toggles_themselves() {
        let mut admin = user(UserRole::Admin);
        admin.is_superuser = true;
        let err = check_toggle(&admin, &admin).unwrap_err();
        assert!(matches!(err, AppError::Invalid { field: "role", .. }));
    }

    #[test]
    fn only_superusers_toggle_admins() {
        let admin = user(UserRole::Admin);
        let other_admin = user(UserRole::Admin);
        assert!(matches!(check_toggle(&admin, &other_admin), Err(AppError::Forbidden(_))));

        let mut root = user(UserRole::Admin);
        root.is_superuser = true;
        assert!(check_toggle(&root, &other_admin).is_ok());
        assert!(check_toggle(&admin, &user(UserRole::User)).is_ok());
    }

    #[test]
    fn deleting_admins_requires_superuser() {
        let admin = user(UserRole::Admin);
        let other_admin = user(UserRole::Admin);
        assert!(matches!(check_delete(&admin, &other_admin), Err(AppError::Forbidden(_))));
        assert!(matches!(
            check_delete(&admin, &admin),
            Err(AppError::Invalid { field: "user", .. })
        ));
        assert!(check_delete(&admin, &user(UserRole::Staff)).is_ok());

        let mut root = user(UserRole::Admin);
        root.is_superuser = true;
        assert!(check_delete(&root, &other_admin).is_ok());
    }

    #[test]
    fn self_role_change_is_rejected_but_unchanged_role_passes() {
        let staff = user(UserRole::Staff);
        assert!(check_role_change(&staff, &staff, UserRole::Staff).is_ok());
        let err = check_role_change(&staff, &staff, UserRole::Admin).unwrap_err();
        assert!(matches!(err, AppError::Invalid { field: "role", .. }));
    }

    #[test]
    fn promoting_to_admin_requires_superuser() {
        let admin = user(UserRole::Admin);
        let target = user(UserRole::User);
        assert!(matches!(
            check_role_change(&admin, &target, UserRole::Admin),
            Err(AppError::Forbidden(_))
        ));

        let mut root = user(UserRole::Admin);
        root.is_superuser = true;
        assert!(check_role_change(&root, &target, UserRole::Admin).is_ok());
    }

    #[test]
    fn demoting_an_admin_requires_superuser() {
        let admin = user(UserRole::Admin);
        let other_admin = user(UserRole::Admin);
        assert!(matches!(
            check_role_change(&admin, &other_admin, UserRole::User),
            Err(AppError::Forbidden(_))
        ));
        assert!(check_role_change(&admin, &user(UserRole::User), UserRole::Staff).is_ok());
    }

    #[test]
    fn pending_staff_is_capped_to_user() {
        let mut staff = user(UserRole::Staff);
        assert_eq!(effective_role(&staff), UserRole::User);
        staff.is_approved_staff = true;
        assert_eq!(effective_role(&staff), UserRole::Staff);
        assert_eq!(effective_role(&user(UserRole::Admin)), UserRole::Admin);
    }
}
