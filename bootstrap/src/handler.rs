//! 命令行使用的消息处理器

use async_trait::async_trait;
use kbus_errors::MessageError;
use kbus_ports::{AttemptContext, ConsumeFailure, DomainMessage, MessageConsumer};
use tracing::{info, trace, warn};

/// 把每条消息写入日志的 consumer
#[derive(Debug, Clone)]
pub struct LoggingConsumer {
    name: String,
}

impl LoggingConsumer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl MessageConsumer for LoggingConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume(
        &self,
        message: &DomainMessage,
        context: &AttemptContext,
    ) -> Result<(), MessageError> {
        let payload = message
            .payload_str()
            .ok_or_else(|| MessageError::validation("Payload is not valid UTF-8"))?;

        info!(
            consumer = %self.name,
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            key = message.key_str(),
            attempt = context.attempt(),
            payload,
            "Message received"
        );
        Ok(())
    }

    async fn handle_failure(&self, failure: &ConsumeFailure, context: &AttemptContext) {
        if failure.is_empty_poll() {
            trace!(consumer = %self.name, reason = %failure, "Nothing to consume");
        } else {
            warn!(
                consumer = %self.name,
                attempt = context.attempt(),
                failure = %failure,
                "Message handling failed"
            );
        }
    }
}
