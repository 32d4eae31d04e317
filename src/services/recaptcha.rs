//! reCAPTCHA v3 人机校验。登录与联系表单两个公开写接口在处理前调用。
//!
//! 未配置 `RECAPTCHA_SECRET_KEY` 时进入跳过模式（`GateMode::Bypass`）：
//! 只要带了 token 就放行。这是开发环境的便利，生产环境必须配置密钥。

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::core::{config::Config, constants::RECAPTCHA_TIMEOUT_SECS, error::AppError};

#[derive(Clone)]
pub enum GateMode {
    /// 跳过远程校验，生产环境不安全
    Bypass,
    Enforce {
        secret: SecretString,
        verify_url: String,
        min_score: f64,
    },
}

/// 单次校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub accepted: bool,
    pub score: f64,
    pub reason: Option<String>,
}

impl GateOutcome {
    fn accept(score: f64) -> Self {
        Self { accepted: true, score, reason: None }
    }

    fn reject(score: f64, reason: impl Into<String>) -> Self {
        Self { accepted: false, score, reason: Some(reason.into()) }
    }
}

/// siteverify 接口的响应体
#[derive(Debug, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

#[derive(Clone)]
pub struct RecaptchaGate {
    mode: GateMode,
    client: reqwest::Client,
}

impl RecaptchaGate {
    pub fn new(mode: GateMode) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RECAPTCHA_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalServerError(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { mode, client })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mode = match config.recaptcha_secret() {
            Some(secret) => GateMode::Enforce {
                secret: secret.clone(),
                verify_url: config.recaptcha_verify_url.clone(),
                min_score: config.recaptcha_min_score,
            },
            None => {
                tracing::warn!("⚠️ RECAPTCHA_SECRET_KEY not set: bot-score verification is BYPASSED. Do not run this in production.");
                GateMode::Bypass
            }
        };
        Self::new(mode)
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self.mode, GateMode::Bypass)
    }

    /// 校验 token。缺少 token 时即使处于跳过模式也拒绝。
    pub async fn verify(&self, token: Option<&str>, action: &str) -> GateOutcome {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return GateOutcome::reject(0.0, "No reCAPTCHA token provided");
        };

        let (secret, verify_url, min_score) = match &self.mode {
            GateMode::Bypass => return GateOutcome::accept(1.0),
            GateMode::Enforce { secret, verify_url, min_score } => (secret, verify_url, *min_score),
        };

        let response = self
            .client
            .post(verify_url)
            .form(&[("secret", secret.expose_secret()), ("response", token)])
            .send()
            .await;

        let body = match response {
            Ok(resp) => resp.json::<SiteVerifyResponse>().await,
            Err(e) => {
                return GateOutcome::reject(0.0, format!("reCAPTCHA verification request failed: {}", e));
            }
        };

        match body {
            Ok(body) => evaluate(&body, action, min_score),
            Err(e) => GateOutcome::reject(0.0, format!("reCAPTCHA verification error: {}", e)),
        }
    }

    /// 处理器使用的版本：失败时返回 `recaptcha` 字段错误（400）。
    pub async fn require(&self, token: Option<&str>, action: &str) -> Result<f64, AppError> {
        let outcome = self.verify(token, action).await;
        if outcome.accepted {
            return Ok(outcome.score);
        }

        let reason = outcome
            .reason
            .unwrap_or_else(|| "reCAPTCHA verification failed".to_string());
        tracing::warn!("🤖 reCAPTCHA rejected ({}): {}", action, reason);
        Err(AppError::invalid("recaptcha", reason))
    }
}

/// 根据 siteverify 的响应判定是否放行。
pub fn evaluate(resp: &SiteVerifyResponse, expected_action: &str, min_score: f64) -> GateOutcome {
    if !resp.success {
        return GateOutcome::reject(
            resp.score,
            format!("reCAPTCHA verification failed: {:?}", resp.error_codes),
        );
    }

    if resp.action.as_deref() != Some(expected_action) {
        return GateOutcome::reject(
            resp.score,
            format!(
                "reCAPTCHA action mismatch: expected {}, got {}",
                expected_action,
                resp.action.as_deref().unwrap_or("none")
            ),
        );
    }

    if resp.score < min_score {
        return GateOutcome::reject(resp.score, format!("reCAPTCHA score too low: {}", resp.score));
    }

    GateOutcome::accept(resp.score)
}
