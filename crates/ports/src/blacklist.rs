//! Blacklist trait 定义

/// topic 黑名单策略
pub trait BlacklistPolicy: Send + Sync {
    fn is_blacklisted(&self, topic: &str) -> bool;
}
