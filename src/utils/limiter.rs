use redis::Script;
use redis::aio::ConnectionManager;

use crate::core::{constants::REDIS_PREFIX_RATE_LIMIT, error::AppError};

/// 固定窗口限流：Lua 脚本保证自增与设置过期时间是原子的。
/// `identity` 通常是邮箱，统一转成小写，避免大小写绕过。
pub async fn check_rate_limit(
    redis_manager: &ConnectionManager,
    action_key: &str,
    identity: &str,
    limit: usize,
    window: u64,
) -> Result<(), AppError> {
    let redis_key = rate_limit_key(action_key, identity);
    let mut conn = redis_manager.clone();

    let script = Script::new(
        r#"
        local count = redis.call("INCR", KEYS[1])
        if count == 1 then
            redis.call("EXPIRE", KEYS[1], ARGV[1])
        end
        return count
    "#,
    );

    let count: usize = script
        .key(&redis_key)
        .arg(window)
        .invoke_async(&mut conn)
        .await?;

    if count > limit {
        tracing::warn!("⛔ Rate limit exceeded: {} on {} ({}/{})", identity, action_key, count, limit);
        return Err(AppError::RateLimitExceeded(format!(
            "Rate limit exceeded. Try again in {} seconds.",
            window
        )));
    }

    Ok(())
}

fn rate_limit_key(action_key: &str, identity: &str) -> String {
    format!(
        "{}{}:{}",
        REDIS_PREFIX_RATE_LIMIT,
        action_key,
        identity.trim().to_lowercase()
    )
}
