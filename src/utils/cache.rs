use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use crate::core::error::AppError;

/// Cache-Aside：先读 Redis，未命中（或 Redis 故障）时执行 `fetcher` 并回填。
///
/// Redis 故障不阻断业务，只记录日志后降级为直接查库。
pub async fn get_or_fetch<T, F, Fut>(
    manager: &ConnectionManager,
    key: &str,
    ttl_seconds: u64,
    fetcher: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, AppError>> + Send,
{
    let mut redis = manager.clone();

    match redis.get::<_, Option<String>>(key).await {
        Ok(Some(json_str)) if !json_str.is_empty() => match serde_json::from_str::<T>(&json_str) {
            Ok(data) => {
                tracing::debug!("✅ Cache hit: {}", key);
                return Ok(data);
            }
            Err(e) => tracing::warn!("⚠️ Cache deserialize failed for {}: {}", key, e),
        },
        Err(e) => tracing::warn!("⚠️ Redis get failed for {}: {}", key, e),
        _ => {}
    };

    tracing::debug!("🔍 Cache miss, fetching from DB: {}", key);
    let data = fetcher().await?;

    set(manager, key, &data, ttl_seconds).await;

    Ok(data)
}

/// 直接覆盖写入（Write-Through 用）。失败只记日志。
pub async fn set<T>(manager: &ConnectionManager, key: &str, data: &T, ttl_seconds: u64)
where
    T: Serialize + Send + Sync,
{
    let mut redis = manager.clone();
    match serde_json::to_string(data) {
        Ok(json_str) => {
            if let Err(e) = redis.set_ex::<_, _, ()>(key, json_str, ttl_seconds).await {
                tracing::warn!("⚠️ Redis set failed for {}: {}", key, e);
            } else {
                tracing::debug!("💾 Cache set: {}", key);
            }
        }
        Err(e) => tracing::error!("❌ Serialization failed: {}", e),
    }
}

/// 角色变更、账号删除等场景下让缓存失效。
pub async fn del(manager: &ConnectionManager, key: &str) {
    let mut redis = manager.clone();
    if let Err(e) = redis.del::<_, ()>(key).await {
        tracing::warn!("⚠️ Redis delete failed for {}: {}", key, e);
    } else {
        tracing::debug!("🗑️ Cache deleted: {}", key);
    }
}
