use serde::Serialize;

/// 后台首页统计。任一计数查询失败时为 0，不影响其它字段。
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: u64,
    pub admin_users: u64,
    pub staff_users: u64,
    pub regular_users: u64,
    pub total_books: u64,
    pub total_borrowed: u64,
    pub total_returned: u64,
    pub total_members: u64,
    pub total_notices: u64,
    pub total_messages: u64,
    pub unread_messages: u64,
    pub total_health_camps: u64,
    pub total_posts: u64,
}
