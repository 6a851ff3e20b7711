//! 重试退避模块
//!
//! 提供有上限的指数退避：每次失败后工作延迟乘以退避乘数，并截断到最大延迟

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 重试策略校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryPolicyError {
    #[error("retry delay must be greater than zero")]
    ZeroInitialDelay,

    #[error("retry multiplier must be >= 1, got {0}")]
    MultiplierTooSmall(f64),

    #[error("max retry delay ({max_ms}ms) must be >= retry delay ({initial_ms}ms)")]
    MaxDelayBelowInitial { initial_ms: u128, max_ms: u128 },
}

/// 重试策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次尝试）
    pub max_retries: u32,
    /// 初始延迟
    pub initial_delay: Duration,
    /// 最大延迟
    pub max_delay: Duration,
    /// 退避乘数
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// 校验不变量：initial > 0，multiplier >= 1，max >= initial
    pub fn validate(&self) -> Result<(), RetryPolicyError> {
        if self.initial_delay.is_zero() {
            return Err(RetryPolicyError::ZeroInitialDelay);
        }
        // NaN 也在这里被拒绝
        if !(self.multiplier >= 1.0) {
            return Err(RetryPolicyError::MultiplierTooSmall(self.multiplier));
        }
        if self.max_delay < self.initial_delay {
            return Err(RetryPolicyError::MaxDelayBelowInitial {
                initial_ms: self.initial_delay.as_millis(),
                max_ms: self.max_delay.as_millis(),
            });
        }
        Ok(())
    }

    /// 总尝试次数（首次 + 重试）
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 是否为最后一次允许的尝试（attempt 从 0 开始）
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt >= self.max_retries
    }

    /// 创建一个从初始延迟开始的退避状态
    pub fn backoff(&self) -> Backoff {
        Backoff {
            current: self.initial_delay,
            policy: self.clone(),
        }
    }
}

/// 退避状态
///
/// 持有当前工作延迟。每条消息的重试序列结束后必须 `reset`，
/// 使下一条消息的重试时序与上一条无关。
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    current: Duration,
}

impl Backoff {
    /// 当前工作延迟
    pub fn current(&self) -> Duration {
        self.current
    }

    /// 增长工作延迟（乘以退避乘数并截断到最大延迟），返回增长后的延迟
    pub fn grow(&mut self) -> Duration {
        let max_nanos = self.policy.max_delay.as_nanos();
        let grown = self.current.as_nanos() as f64 * self.policy.multiplier;

        self.current = if grown >= max_nanos as f64 {
            self.policy.max_delay
        } else {
            Duration::from_nanos(grown.round() as u64)
        };

        self.current
    }

    /// 重置为初始延迟
    pub fn reset(&mut self) {
        self.current = self.policy.initial_delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32, initial_ms: u64, max_ms: u64, multiplier: f64) -> RetryPolicy {
        RetryPolicy::new(
            max_retries,
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            multiplier,
        )
    }

    #[test]
    fn test_backoff_grows_then_clamps() {
        let mut backoff = policy(5, 100, 1000, 2.0).backoff();

        assert_eq!(backoff.current(), Duration::from_millis(100));
        assert_eq!(backoff.grow(), Duration::from_millis(200));
        assert_eq!(backoff.grow(), Duration::from_millis(400));
        assert_eq!(backoff.grow(), Duration::from_millis(800));
        assert_eq!(backoff.grow(), Duration::from_millis(1000));
        assert_eq!(backoff.grow(), Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_clamps_on_first_growth() {
        let mut backoff = policy(3, 400, 500, 3.0).backoff();

        let delays: Vec<_> = (0..3).map(|_| backoff.grow()).collect();
        assert_eq!(delays, vec![Duration::from_millis(500); 3]);
    }

    #[test]
    fn test_backoff_reset() {
        let mut backoff = policy(3, 100, 1000, 2.0).backoff();
        backoff.grow();
        backoff.grow();

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_millis(100));
        assert_eq!(backoff.grow(), Duration::from_millis(200));
    }

    #[test]
    fn test_multiplier_of_one_keeps_delay() {
        let mut backoff = policy(3, 250, 1000, 1.0).backoff();
        assert_eq!(backoff.grow(), Duration::from_millis(250));
        assert_eq!(backoff.grow(), Duration::from_millis(250));
    }

    #[test]
    fn test_last_attempt() {
        let policy = policy(2, 100, 1000, 2.0);
        assert_eq!(policy.max_attempts(), 3);
        assert!(!policy.is_last_attempt(0));
        assert!(!policy.is_last_attempt(1));
        assert!(policy.is_last_attempt(2));

        let no_retries = RetryPolicy::default();
        assert!(no_retries.is_last_attempt(0));
    }

    #[test]
    fn test_validate() {
        assert!(policy(2, 100, 1000, 2.0).validate().is_ok());
        assert_eq!(
            policy(2, 0, 1000, 2.0).validate(),
            Err(RetryPolicyError::ZeroInitialDelay)
        );
        assert_eq!(
            policy(2, 100, 1000, 0.5).validate(),
            Err(RetryPolicyError::MultiplierTooSmall(0.5))
        );
        assert!(policy(2, 100, 1000, f64::NAN).validate().is_err());
        assert_eq!(
            policy(2, 500, 100, 2.0).validate(),
            Err(RetryPolicyError::MaxDelayBelowInitial {
                initial_ms: 500,
                max_ms: 100
            })
        );
    }
}
