//! 限流重试
//!
//! 只对限流信号（429 / RESOURCE_EXHAUSTED）做指数退避重试，其他错误立即返回。

use crate::config::Config;
use crate::error::LlmError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 退避重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次调用之后最多重试的次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// 抖动上限，实际抖动在 `[0, jitter_max)` 内均匀分布
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            jitter_max: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: delay_secs(config.retry_base_delay_secs),
            max_delay: delay_secs(config.retry_max_delay_secs),
            ..Self::default()
        }
    }

    /// 第 `attempt` 次（从 0 开始）失败后的等待时间：
    /// `min(max_delay, base_delay * 2^attempt + jitter)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = self.jitter_max.mul_f64(rand::random::<f64>());
        self.backoff(attempt, jitter)
    }

    fn backoff(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let exp = self.base_delay.checked_mul(factor).unwrap_or(self.max_delay);
        (exp + jitter).min(self.max_delay)
    }
}

/// 配置中的等待秒数限制在 `[0, MAX_DELAY_SECS]`，NaN 与无穷大取上限
const MAX_DELAY_SECS: f64 = 3600.0;

fn delay_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_DELAY_SECS)).unwrap_or(Duration::from_secs_f64(MAX_DELAY_SECS))
}

/// 执行 `op`，遇到限流时按策略退避重试
///
/// 重试耗尽后返回 [`LlmError::ServiceBusy`]；非限流错误原样返回，不重试。
pub async fn retry_on_rate_limit<F, Fut, T>(policy: &RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() => {
                if attempt >= policy.max_retries {
                    warn!("⛔ 限流重试已耗尽 ({} 次)", policy.max_retries);
                    return Err(LlmError::ServiceBusy {
                        attempts: attempt + 1,
                    });
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    "⚠️ 触发频率限制，{:.2} 秒后重试... (第 {}/{} 次)",
                    delay.as_secs_f64(),
                    attempt + 1,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
