//! 生命周期事件

use std::time::Duration;

/// 消费指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionMetrics {
    /// 已消费消息总数
    pub consumed_messages: u64,
    /// 最近一次循环的处理耗时
    pub last_duration: Duration,
}

/// 生命周期事件接收器
///
/// 每个消费周期前后各收到一次通知
pub trait LifecycleEventSink: Send + Sync {
    fn pre_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics);

    fn post_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics);
}
