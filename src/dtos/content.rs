use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use validator::Validate;

// ---------- 公告 ----------

#[derive(Deserialize, Validate)]
pub struct CreateNoticeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub attachment: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateNoticeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub attachment: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct NoticeQuery {
    pub search: Option<String>,
    /// `yes` / `no`
    pub has_attachment: Option<String>,
}

// ---------- 成员 ----------

#[derive(Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub designation: String,
    #[serde(default)]
    pub bio: String,
    pub image: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub contact_number: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default, rename = "order")]
    pub display_order: i32,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub designation: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    #[validate(length(max = 20))]
    pub contact_number: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(rename = "order")]
    pub display_order: Option<i32>,
}

// ---------- 轮播图 ----------

#[derive(Deserialize, Validate)]
pub struct CreateCarouselRequest {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: String,
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, rename = "order")]
    pub display_order: i32,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateCarouselRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: Option<String>,
    pub caption: Option<String>,
    pub is_active: Option<bool>,
    #[serde(rename = "order")]
    pub display_order: Option<i32>,
}

// ---------- 联系表单 ----------

#[derive(Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub message: String,
    pub recaptcha_token: Option<String>,
}

/// 留言创建后只有已读标记可以修改
#[derive(Deserialize)]
pub struct UpdateContactRequest {
    pub is_read: bool,
}

// ---------- 义诊 ----------

#[derive(Deserialize, Validate)]
pub struct CreateHealthCampRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    pub date_time: DateTime<FixedOffset>,
    #[validate(length(min = 1, max = 255))]
    pub doctor_name: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateHealthCampRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    pub date_time: Option<DateTime<FixedOffset>>,
    #[validate(length(min = 1, max = 255))]
    pub doctor_name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct HealthCampQuery {
    pub search: Option<String>,
    /// `upcoming` / `past`
    pub time: Option<String>,
}

fn default_true() -> bool {
    true
}
