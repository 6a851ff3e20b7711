//! 消费端客户端 trait 定义

use std::time::Duration;

use async_trait::async_trait;
use kbus_config::ResolvedConfiguration;
use kbus_errors::AppResult;

/// 拉取结果状态码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// 正常消息
    Ok,
    /// 分区已无更多消息
    PartitionEof,
    /// 拉取超时
    TimedOut,
    /// broker 返回的其他错误
    BrokerError(String),
}

/// broker 返回的原始记录
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub status: RecordStatus,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
    /// 毫秒时间戳
    pub timestamp: Option<i64>,
}

impl RawRecord {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            status: RecordStatus::Ok,
            topic: topic.into(),
            partition,
            offset,
            key: None,
            payload: Some(payload.into()),
            timestamp: None,
        }
    }

    /// 只携带状态码的记录（无 topic / offset / payload）
    pub fn status_only(status: RecordStatus) -> Self {
        Self {
            status,
            topic: String::new(),
            partition: -1,
            offset: -1,
            key: None,
            payload: None,
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn without_payload(mut self) -> Self {
        self.payload = None;
        self
    }
}

/// 消费端客户端
///
/// 订阅、带超时拉取、提交偏移量
#[async_trait]
pub trait ConsumerClient: Send {
    /// 订阅 topics
    fn subscribe(&mut self, topics: &[String]) -> AppResult<()>;

    /// 拉取一条记录，超时内无记录时可返回 `None`
    async fn poll(&mut self, timeout: Duration) -> AppResult<Option<RawRecord>>;

    /// 提交记录的偏移量
    async fn commit(&mut self, record: &RawRecord) -> AppResult<()>;
}

/// 按已解析配置创建消费端客户端
pub trait ConsumerClientFactory: Send + Sync {
    type Client: ConsumerClient;

    fn create(&self, configuration: &ResolvedConfiguration) -> AppResult<Self::Client>;
}
