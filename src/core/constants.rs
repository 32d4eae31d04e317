// ==========================================
// Redis Key 前缀定义：这些常量用于构建Redis缓存键的前缀部分，确保键名的一致性和可管理性。
// ==========================================

/// Refresh Token 前缀：用于存储刷新令牌的Redis键前缀。
pub const REDIS_PREFIX_REFRESH: &str = "refresh_token:";

/// 黑名单前缀：用于存储已注销的访问令牌。
pub const REDIS_PREFIX_BLACKLIST: &str = "blacklist:token:";

/// 已使用 Token 前缀：用于标记已轮换过的刷新令牌，防止重复使用。
pub const REDIS_PREFIX_USED: &str = "USED:";

/// 用户资料缓存前缀。注意末尾的冒号。
pub const REDIS_PREFIX_USER_PROFILE: &str = "cache:user:profile:";

/// 限流计数器前缀。
pub const REDIS_PREFIX_RATE_LIMIT: &str = "rate_limit:";

// ==========================================
// 业务逻辑常量
// ==========================================

/// Token 轮换宽限期（秒）
pub const ROTATION_GRACE_PERIOD: u64 = 10;

/// 用户资料缓存过期时间（24小时）
pub const CACHE_EXPIRE_USER_PROFILE: u64 = 60 * 60 * 24;

/// 邮箱验证令牌长度（字母数字）
pub const VERIFICATION_TOKEN_LEN: usize = 64;

// ==========================================
// reCAPTCHA
// ==========================================

pub const RECAPTCHA_DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

pub const RECAPTCHA_DEFAULT_MIN_SCORE: f64 = 0.5;

/// 调用 siteverify 的超时时间（秒）
pub const RECAPTCHA_TIMEOUT_SECS: u64 = 10;

pub const RECAPTCHA_ACTION_LOGIN: &str = "login";
pub const RECAPTCHA_ACTION_CONTACT: &str = "contact";
