//! Consumer trait 定义

use std::sync::Arc;

use async_trait::async_trait;
use kbus_config::ResolvedConfiguration;
use kbus_errors::MessageError;
use thiserror::Error;

use crate::DomainMessage;

/// 空拉取的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmptyPollReason {
    #[error("No message was returned within the poll timeout")]
    NoMessage,

    #[error("Currently, there are no more messages in the partition")]
    PartitionEof,

    #[error("Brokers timed out or there are no messages")]
    TimedOut,

    #[error("Null payload received in message")]
    NullPayload,

    #[error("Broker reported an error: {0}")]
    BrokerError(String),
}

impl EmptyPollReason {
    /// broker 报告的错误，持续出现通常意味着认证或 topic 配置有误
    pub fn is_broker_error(&self) -> bool {
        matches!(self, EmptyPollReason::BrokerError(_))
    }
}

/// 交给 consumer 失败处理器的失败信息
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumeFailure {
    /// 本周期没有可处理的消息
    #[error(transparent)]
    EmptyPoll(EmptyPollReason),

    /// 消息无效，不会重试
    #[error("Invalid message: {0}")]
    Validation(String),

    /// 暂时性失败，可能重试
    #[error("Recoverable failure: {0}")]
    Recoverable(String),
}

impl ConsumeFailure {
    pub fn is_empty_poll(&self) -> bool {
        matches!(self, ConsumeFailure::EmptyPoll(_))
    }
}

/// 单次尝试的上下文
#[derive(Debug, Clone)]
pub struct AttemptContext {
    configuration: Arc<ResolvedConfiguration>,
    attempt: u32,
}

impl AttemptContext {
    pub fn new(configuration: Arc<ResolvedConfiguration>, attempt: u32) -> Self {
        Self {
            configuration,
            attempt,
        }
    }

    pub fn configuration(&self) -> &ResolvedConfiguration {
        &self.configuration
    }

    /// 从 0 开始的尝试序号
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }
}

/// 消息消费者
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// consumer 名称，用于解析配置
    fn name(&self) -> &str;

    /// 处理一条消息
    async fn consume(
        &self,
        message: &DomainMessage,
        context: &AttemptContext,
    ) -> Result<(), MessageError>;

    /// 处理失败（包括空拉取）
    async fn handle_failure(&self, failure: &ConsumeFailure, context: &AttemptContext);
}
