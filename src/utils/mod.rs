pub mod cache;
pub mod limiter;
pub mod search;

/// 限流宏。
/// 用法: rate_limit!(&state.redis, "action_name", &email, max_count, window_seconds);
#[macro_export]
macro_rules! rate_limit {
    ($redis:expr, $action:expr, $key:expr, $limit:expr, $window:expr) => {
        if let Err(e) = $crate::utils::limiter::check_rate_limit($redis, $action, $key, $limit, $window).await {
            return Err(e.into());
        }
    };
}
