// src/dtos/user.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::enums::UserRole;
use crate::dtos::MOBILE_REGEX;
use crate::entity::users;

/// 用户资料。Deserialize + Clone 用于 Redis 缓存的读写。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_approved_staff: bool,
    pub is_staff_applicant: bool,
    pub is_superuser: bool,
    pub village_street: Option<String>,
    pub upazilla: Option<String>,
    pub district: Option<String>,
    pub division: Option<String>,
    pub country: Option<String>,
    pub mobile_number: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for UserProfile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_verified: user.is_verified,
            is_approved_staff: user.is_approved_staff,
            is_staff_applicant: user.is_staff_applicant,
            is_superuser: user.is_superuser,
            village_street: user.village_street,
            upazilla: user.upazilla,
            district: user.district,
            division: user.division,
            country: user.country,
            mobile_number: user.mobile_number,
            profile_picture: user.profile_picture,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// 资料更新（本人或管理员）。email / is_verified / is_approved_staff / is_superuser 只读，不在此列。
#[derive(Deserialize, Validate, Default)]
pub struct UpdateUserRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(length(max = 255))]
    pub village_street: Option<String>,
    #[validate(length(max = 100))]
    pub upazilla: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(max = 100))]
    pub division: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(regex(path = *MOBILE_REGEX, message = "Invalid mobile number format"))]
    pub mobile_number: Option<String>,
    pub profile_picture: Option<String>,
    /// 受角色修改守卫约束，见 `services::roles::check_role_change`
    pub role: Option<UserRole>,
    pub is_staff_applicant: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub search: Option<String>,
}
