//! Kafka Producer
//!
//! producer 资源缓存四级资源的 Kafka 实现

use std::time::Duration;

use async_trait::async_trait;
use kbus_config::{ResolvedConfiguration, UNASSIGNED_PARTITION};
use kbus_errors::{AppError, AppResult};
use kbus_ports::{OutboundMessage, ProducerBackend};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::debug;

use crate::KafkaConfigurationFactory;

/// 发送队列已满时 `send` 的最长等待时间
const DEFAULT_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// topic 句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaTopic {
    pub name: String,
    /// 固定分区，`None` 表示由客户端分配
    pub partition: Option<i32>,
}

impl KafkaTopic {
    pub fn new(name: impl Into<String>, partition: i32) -> Self {
        Self {
            name: name.into(),
            partition: (partition != UNASSIGNED_PARTITION).then_some(partition),
        }
    }
}

/// 基于 `FutureProducer` 的 producer 后端
#[derive(Debug, Clone)]
pub struct KafkaProducerBackend {
    configuration_factory: KafkaConfigurationFactory,
    queue_timeout: Duration,
}

impl Default for KafkaProducerBackend {
    fn default() -> Self {
        Self::new(KafkaConfigurationFactory::new())
    }
}

impl KafkaProducerBackend {
    pub fn new(configuration_factory: KafkaConfigurationFactory) -> Self {
        Self {
            configuration_factory,
            queue_timeout: DEFAULT_QUEUE_TIMEOUT,
        }
    }

    /// 设置超时时间
    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }
}

#[async_trait]
impl ProducerBackend for KafkaProducerBackend {
    type ClientConfig = ClientConfig;
    type Client = FutureProducer;
    type Topic = KafkaTopic;

    fn create_client_config(
        &self,
        configuration: &ResolvedConfiguration,
    ) -> AppResult<ClientConfig> {
        Ok(self.configuration_factory.create(configuration))
    }

    fn create_client(&self, config: &ClientConfig) -> AppResult<FutureProducer> {
        config.create().map_err(|e| {
            AppError::configuration(format!("Failed to create Kafka producer: {}", e))
        })
    }

    fn new_topic(
        &self,
        _client: &FutureProducer,
        name: &str,
        configuration: &ResolvedConfiguration,
    ) -> AppResult<KafkaTopic> {
        Ok(KafkaTopic::new(
            name,
            configuration.options().producer_partition,
        ))
    }

    async fn publish(
        &self,
        client: &FutureProducer,
        topic: &KafkaTopic,
        message: &OutboundMessage,
    ) -> AppResult<()> {
        let mut record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(&topic.name).payload(message.payload.as_slice());
        if let Some(key) = &message.key {
            record = record.key(key.as_slice());
        }
        if let Some(partition) = topic.partition {
            record = record.partition(partition);
        }

        let (partition, offset) = client
            .send(record, Timeout::After(self.queue_timeout))
            .await
            .map_err(|(e, _)| AppError::broker(format!("Failed to publish message: {}", e)))?;

        debug!(
            topic = %topic.name,
            partition,
            offset,
            "Message delivered"
        );

        Ok(())
    }

    fn flush(&self, client: &FutureProducer, timeout: Duration) -> AppResult<()> {
        client
            .flush(Timeout::After(timeout))
            .map_err(|e| AppError::broker(format!("Failed to flush producer: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbus_config::{ClientOptions, ClientRole};

    #[test]
    fn test_topic_partition_assignment() {
        assert_eq!(KafkaTopic::new("events", -1).partition, None);
        assert_eq!(KafkaTopic::new("events", 0).partition, Some(0));
        assert_eq!(KafkaTopic::new("events", 4).partition, Some(4));
    }

    #[test]
    fn test_new_topic_uses_configured_partition() {
        let options = ClientOptions {
            topics: vec!["events".to_string()],
            producer_partition: 2,
            ..ClientOptions::default()
        };
        let configuration =
            ResolvedConfiguration::new(ClientRole::Producer, "events", options).unwrap();

        let backend = KafkaProducerBackend::default();
        let config = backend.create_client_config(&configuration).unwrap();
        // 创建 producer 不需要连接 broker
        let client = backend.create_client(&config).unwrap();
        let topic = backend.new_topic(&client, "events", &configuration).unwrap();

        assert_eq!(topic, KafkaTopic { name: "events".to_string(), partition: Some(2) });
    }

    #[tokio::test]
    #[ignore] // 需要 Kafka 实例
    async fn test_publish() {
        let options = ClientOptions {
            topics: vec!["kbus-test".to_string()],
            ..ClientOptions::default()
        };
        let configuration =
            ResolvedConfiguration::new(ClientRole::Producer, "kbus-test", options).unwrap();

        let backend = KafkaProducerBackend::default();
        let config = backend.create_client_config(&configuration).unwrap();
        let client = backend.create_client(&config).unwrap();
        let topic = backend.new_topic(&client, "kbus-test", &configuration).unwrap();

        backend
            .publish(&client, &topic, &OutboundMessage::new("hello").with_key("k"))
            .await
            .unwrap();
        backend.flush(&client, Duration::from_secs(5)).unwrap();
    }
}
