//! 客户端选项
//!
//! 合并后的强类型选项，字段名即配置键名

use std::collections::BTreeMap;
use std::time::Duration;

use kbus_common::RetryPolicy;
use serde::{Deserialize, Serialize};

/// 由 broker 客户端自行分配分区
pub const UNASSIGNED_PARTITION: i32 = -1;

/// 客户端选项（所有字段均有默认值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Broker 地址列表
    pub brokers: Vec<String>,
    /// 订阅或发布的 topics
    pub topics: Vec<String>,
    /// 解码器名称
    pub decoder: String,
    /// 客户端库日志级别（syslog 级别）
    pub log_level: i32,
    /// 拉取超时（毫秒）
    pub timeout: u64,
    /// 最大重试次数
    pub max_retries: u32,
    /// 初始重试延迟（毫秒）
    pub retry_delay: u64,
    /// 最大重试延迟（毫秒）
    pub max_retry_delay: u64,
    /// 退避乘数
    pub retry_multiplier: f64,
    /// 自动提交
    pub enable_auto_commit: bool,
    pub auto_commit_interval_ms: u64,
    pub auto_offset_reset: String,
    pub enable_auto_offset_store: bool,
    /// 消费者组 ID
    pub group_id: String,
    /// producer 固定分区，-1 表示不指定
    pub producer_partition: i32,
    /// 透传给客户端库的原始配置项
    pub properties: BTreeMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            brokers: vec!["127.0.0.1:9092".to_string()],
            topics: Vec::new(),
            decoder: "plain".to_string(),
            log_level: 3,
            timeout: 1000,
            max_retries: 0,
            retry_delay: 200,
            max_retry_delay: 2000,
            retry_multiplier: 2.0,
            enable_auto_commit: true,
            auto_commit_interval_ms: 5000,
            auto_offset_reset: "earliest".to_string(),
            enable_auto_offset_store: true,
            group_id: "kbus".to_string(),
            producer_partition: UNASSIGNED_PARTITION,
            properties: BTreeMap::new(),
        }
    }
}

impl ClientOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_delay),
            Duration::from_millis(self.max_retry_delay),
            self.retry_multiplier,
        )
    }

    /// 校验选项，返回第一个不合法项的描述
    pub fn validate(&self) -> Result<(), String> {
        if self.brokers.is_empty() || self.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err("brokers must be a non-empty list of addresses".to_string());
        }
        if self.topics.is_empty() || self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err("topics must be a non-empty list of names".to_string());
        }
        if self.decoder.trim().is_empty() {
            return Err("decoder cannot be empty".to_string());
        }
        if self.group_id.trim().is_empty() {
            return Err("group_id cannot be empty".to_string());
        }
        if self.producer_partition < UNASSIGNED_PARTITION {
            return Err(format!(
                "producer_partition must be >= {UNASSIGNED_PARTITION}, got {}",
                self.producer_partition
            ));
        }
        self.retry_policy().validate().map_err(|e| e.to_string())
    }
}
