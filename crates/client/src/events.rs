//! 生命周期事件接收器实现

use std::sync::Arc;

use kbus_ports::{ConsumptionMetrics, LifecycleEventSink};
use metrics::{counter, gauge, histogram};
use tracing::debug;

/// 以 debug 日志输出指标快照
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl LifecycleEventSink for TracingEventSink {
    fn pre_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics) {
        debug!(
            consumer,
            consumed_messages = metrics.consumed_messages,
            last_duration_ms = metrics.last_duration.as_millis() as u64,
            "Pre message consumed"
        );
    }

    fn post_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics) {
        debug!(
            consumer,
            consumed_messages = metrics.consumed_messages,
            last_duration_ms = metrics.last_duration.as_millis() as u64,
            "Post message consumed"
        );
    }
}

/// 将指标快照写入 `metrics` recorder
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEventSink;

impl LifecycleEventSink for MetricsEventSink {
    fn pre_message_consumed(&self, consumer: &str, _metrics: &ConsumptionMetrics) {
        counter!("kbus_consumer_cycles_total", "consumer" => consumer.to_string()).increment(1);
    }

    fn post_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics) {
        gauge!("kbus_consumer_consumed_messages", "consumer" => consumer.to_string())
            .set(metrics.consumed_messages as f64);
        histogram!("kbus_consumer_message_duration_seconds", "consumer" => consumer.to_string())
            .record(metrics.last_duration.as_secs_f64());
    }
}

/// 按顺序转发给多个接收器
#[derive(Clone, Default)]
pub struct FanOutEventSink {
    sinks: Vec<Arc<dyn LifecycleEventSink>>,
}

impl FanOutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LifecycleEventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LifecycleEventSink for FanOutEventSink {
    fn pre_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics) {
        for sink in &self.sinks {
            sink.pre_message_consumed(consumer, metrics);
        }
    }

    fn post_message_consumed(&self, consumer: &str, metrics: &ConsumptionMetrics) {
        for sink in &self.sinks {
            sink.post_message_consumed(consumer, metrics);
        }
    }
}
