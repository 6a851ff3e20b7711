//! Kafka Consumer
//!
//! 基于 `StreamConsumer` 的消费端客户端：带超时拉取、同步提交

use std::time::Duration;

use async_trait::async_trait;
use kbus_config::ResolvedConfiguration;
use kbus_errors::{AppError, AppResult};
use kbus_ports::{ConsumerClient, ConsumerClientFactory, RawRecord, RecordStatus};
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info, warn};

use crate::KafkaConfigurationFactory;

/// 把 broker 消息转换为原始记录
fn to_raw_record(message: &BorrowedMessage<'_>) -> RawRecord {
    RawRecord {
        status: RecordStatus::Ok,
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key: message.key().map(<[u8]>::to_vec),
        payload: message.payload().map(<[u8]>::to_vec),
        timestamp: message.timestamp().to_millis(),
    }
}

/// 把拉取错误映射为记录状态
pub fn status_for_error(err: &KafkaError) -> RecordStatus {
    match err {
        KafkaError::PartitionEOF(_) => RecordStatus::PartitionEof,
        other => RecordStatus::BrokerError(other.to_string()),
    }
}

/// Kafka 消费端客户端
pub struct KafkaConsumerClient {
    consumer: StreamConsumer,
    name: String,
}

impl KafkaConsumerClient {
    pub fn new(consumer: StreamConsumer, name: impl Into<String>) -> Self {
        Self {
            consumer,
            name: name.into(),
        }
    }

    /// 获取内部 consumer（用于高级操作）
    pub fn inner(&self) -> &StreamConsumer {
        &self.consumer
    }
}

#[async_trait]
impl ConsumerClient for KafkaConsumerClient {
    fn subscribe(&mut self, topics: &[String]) -> AppResult<()> {
        let topics: Vec<&str> = topics.iter().map(|s| s.as_str()).collect();
        self.consumer
            .subscribe(&topics)
            .map_err(|e| AppError::broker(format!("Failed to subscribe to topics: {}", e)))?;

        info!(consumer = %self.name, topics = ?topics, "Kafka consumer subscribed");
        Ok(())
    }

    async fn poll(&mut self, timeout: Duration) -> AppResult<Option<RawRecord>> {
        let record = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => RawRecord::status_only(RecordStatus::TimedOut),
            Ok(Ok(message)) => to_raw_record(&message),
            Ok(Err(err)) => {
                let status = status_for_error(&err);
                if matches!(status, RecordStatus::BrokerError(_)) {
                    warn!(consumer = %self.name, error = %err, "Kafka poll returned an error");
                } else {
                    debug!(consumer = %self.name, error = %err, "Partition end reached");
                }
                RawRecord::status_only(status)
            }
        };

        Ok(Some(record))
    }

    async fn commit(&mut self, record: &RawRecord) -> AppResult<()> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&record.topic, record.partition, Offset::Offset(record.offset + 1))
            .map_err(|e| AppError::broker(format!("Failed to build commit offsets: {}", e)))?;

        self.consumer
            .commit(&offsets, CommitMode::Sync)
            .map_err(|e| AppError::broker(format!("Failed to commit offset: {}", e)))?;

        debug!(
            consumer = %self.name,
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            "Offset committed"
        );
        Ok(())
    }
}

/// 按已解析配置创建 [`KafkaConsumerClient`]
#[derive(Debug, Clone, Default)]
pub struct KafkaConsumerFactory {
    configuration_factory: KafkaConfigurationFactory,
}

impl KafkaConsumerFactory {
    pub fn new(configuration_factory: KafkaConfigurationFactory) -> Self {
        Self {
            configuration_factory,
        }
    }
}

impl ConsumerClientFactory for KafkaConsumerFactory {
    type Client = KafkaConsumerClient;

    fn create(&self, configuration: &ResolvedConfiguration) -> AppResult<KafkaConsumerClient> {
        let consumer: StreamConsumer = self
            .configuration_factory
            .create(configuration)
            .create()
            .map_err(|e| {
                AppError::configuration(format!("Failed to create Kafka consumer: {}", e))
            })?;

        info!(
            consumer = configuration.name(),
            group_id = %configuration.options().group_id,
            "Kafka consumer created"
        );

        Ok(KafkaConsumerClient::new(consumer, configuration.name()))
    }
}
