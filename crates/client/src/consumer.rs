//! 消费循环
//!
//! 每个周期：发出 pre 事件 → 带超时拉取 → 分类 → 重试序列 → 计数 → 发出 post 事件。
//!
//! 失败分类：
//! - 空拉取：交给失败处理器，不计数，不进入重试序列
//! - `Validation`：不重试；关闭自动提交时显式提交该记录
//! - `Recoverable`：按退避策略重试，耗尽后放弃该消息，不提交
//! - `Fatal`：终止循环，原样返回

use std::sync::Arc;

use kbus_common::{Backoff, RetryPolicy};
use kbus_config::{ConfigurationResolver, ResolvedConfiguration, RuntimeOverrides};
use kbus_errors::{AppResult, MessageError};
use kbus_ports::{
    AttemptContext, ConsumeFailure, ConsumerClient, ConsumerClientFactory, ConsumptionMetrics,
    EmptyPollReason, LifecycleEventSink, MessageConsumer, RawRecord, RecordStatus,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::MessageFactory;

/// 重试序列的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// 第 `attempts` 次尝试成功
    Succeeded { attempts: u32 },
    /// 消息无效被拒绝
    Rejected { committed: bool },
    /// 可恢复失败，重试次数耗尽
    Exhausted { attempts: u32 },
}

/// 对拉取结果分类，无可处理消息时返回空拉取原因
pub fn classify_poll(record: Option<RawRecord>) -> Result<RawRecord, EmptyPollReason> {
    let Some(record) = record else {
        return Err(EmptyPollReason::NoMessage);
    };

    match &record.status {
        RecordStatus::PartitionEof => return Err(EmptyPollReason::PartitionEof),
        RecordStatus::TimedOut => return Err(EmptyPollReason::TimedOut),
        RecordStatus::BrokerError(reason) => {
            return Err(EmptyPollReason::BrokerError(reason.clone()));
        }
        RecordStatus::Ok => {}
    }

    match record.payload.as_deref() {
        None | Some([]) => Err(EmptyPollReason::NullPayload),
        Some(_) => Ok(record),
    }
}

/// 消费循环
///
/// 单个实例在单个任务中运行：消费计数与工作延迟都归循环独占，
/// 外部只能通过 [`ConsumptionLoop::metrics`] 或事件接收器读取快照。
pub struct ConsumptionLoop<F> {
    resolver: Arc<ConfigurationResolver>,
    client_factory: F,
    message_factory: MessageFactory,
    events: Option<Arc<dyn LifecycleEventSink>>,
    metrics: ConsumptionMetrics,
}

impl<F: ConsumerClientFactory> ConsumptionLoop<F> {
    pub fn new(
        resolver: Arc<ConfigurationResolver>,
        client_factory: F,
        message_factory: MessageFactory,
    ) -> Self {
        Self {
            resolver,
            client_factory,
            message_factory,
            events: None,
            metrics: ConsumptionMetrics::default(),
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn LifecycleEventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// 当前指标快照
    pub fn metrics(&self) -> ConsumptionMetrics {
        self.metrics
    }

    /// 运行消费循环，直到 `shutdown` 被取消或出现未分类错误
    ///
    /// 取消只在周期开始处检查，进行中的重试序列总会先完成。
    pub async fn consume<C>(
        &mut self,
        consumer: &C,
        overrides: Option<&RuntimeOverrides>,
        shutdown: &CancellationToken,
    ) -> AppResult<()>
    where
        C: MessageConsumer + ?Sized,
    {
        let name = consumer.name();
        let configuration = self.resolver.resolve_consumer(name, overrides)?;
        let timeout = configuration.timeout();
        let policy = configuration.retry_policy();

        let mut client = self.client_factory.create(&configuration)?;
        client.subscribe(configuration.topics())?;

        info!(
            consumer = name,
            topics = ?configuration.topics(),
            max_retries = policy.max_retries,
            auto_commit = configuration.auto_commit_enabled(),
            "Consumer subscribed"
        );

        let mut backoff = policy.backoff();

        while !shutdown.is_cancelled() {
            let cycle_start = Instant::now();

            if let Some(sink) = &self.events {
                sink.pre_message_consumed(name, &self.metrics);
            }

            let polled = client.poll(timeout).await.inspect_err(|e| {
                error!(consumer = name, error = %e, "Poll failed, stopping consumer");
            })?;

            let record = match classify_poll(polled) {
                Ok(record) => record,
                Err(reason) => {
                    if reason.is_broker_error() {
                        warn!(consumer = name, reason = %reason, "Poll returned a broker error");
                    } else {
                        trace!(consumer = name, reason = %reason, "Empty poll");
                    }
                    let context = AttemptContext::new(Arc::clone(&configuration), 0);
                    consumer
                        .handle_failure(&ConsumeFailure::EmptyPoll(reason), &context)
                        .await;

                    self.metrics.last_duration = cycle_start.elapsed();
                    continue;
                }
            };

            let outcome = self
                .run_retry_sequence(
                    consumer,
                    &mut client,
                    &configuration,
                    &record,
                    &policy,
                    &mut backoff,
                )
                .await;

            // 下一条消息从初始延迟重新开始
            backoff.reset();

            let outcome = outcome?;
            debug!(
                consumer = name,
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                outcome = ?outcome,
                "Message processed"
            );

            self.metrics.consumed_messages += 1;
            self.metrics.last_duration = cycle_start.elapsed();

            if let Some(sink) = &self.events {
                sink.post_message_consumed(name, &self.metrics);
            }
        }

        info!(
            consumer = name,
            consumed_messages = self.metrics.consumed_messages,
            "Consumer stopped"
        );

        Ok(())
    }

    async fn run_retry_sequence<C, K>(
        &self,
        consumer: &C,
        client: &mut K,
        configuration: &Arc<ResolvedConfiguration>,
        record: &RawRecord,
        policy: &RetryPolicy,
        backoff: &mut Backoff,
    ) -> AppResult<RetryOutcome>
    where
        C: MessageConsumer + ?Sized,
        K: ConsumerClient,
    {
        let name = consumer.name();

        // 最后一次尝试的可恢复失败返回 Exhausted，attempt 不会超过 max_retries
        let mut attempt = 0;
        loop {
            let context = AttemptContext::new(Arc::clone(configuration), attempt);

            let result = match self.message_factory.create(record, configuration) {
                Ok(message) => consumer.consume(&message, &context).await,
                Err(err) => Err(err),
            };

            let err = match result {
                Ok(()) => {
                    if attempt > 0 {
                        info!(
                            consumer = name,
                            topic = %record.topic,
                            offset = record.offset,
                            attempt,
                            "Message processed successfully after retry"
                        );
                    }
                    return Ok(RetryOutcome::Succeeded {
                        attempts: attempt + 1,
                    });
                }
                Err(err) => err,
            };

            match err {
                MessageError::Validation(reason) => {
                    warn!(
                        consumer = name,
                        topic = %record.topic,
                        partition = record.partition,
                        offset = record.offset,
                        attempt,
                        reason = %reason,
                        "Message rejected"
                    );
                    consumer
                        .handle_failure(&ConsumeFailure::Validation(reason), &context)
                        .await;

                    let committed = !configuration.auto_commit_enabled();
                    if committed {
                        client.commit(record).await?;
                    }

                    return Ok(RetryOutcome::Rejected { committed });
                }
                MessageError::Recoverable(reason) => {
                    consumer
                        .handle_failure(&ConsumeFailure::Recoverable(reason.clone()), &context)
                        .await;

                    if policy.is_last_attempt(attempt) {
                        warn!(
                            consumer = name,
                            topic = %record.topic,
                            partition = record.partition,
                            offset = record.offset,
                            attempts = attempt + 1,
                            reason = %reason,
                            "Retries exhausted, giving up on message"
                        );
                        return Ok(RetryOutcome::Exhausted {
                            attempts: attempt + 1,
                        });
                    }

                    let delay = backoff.grow();
                    warn!(
                        consumer = name,
                        topic = %record.topic,
                        partition = record.partition,
                        offset = record.offset,
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Failed to process message, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                MessageError::Fatal(err) => {
                    error!(
                        consumer = name,
                        topic = %record.topic,
                        partition = record.partition,
                        offset = record.offset,
                        attempt,
                        kind = err.kind(),
                        error = %err,
                        "Unclassified failure, stopping consumer"
                    );
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty_polls() {
        assert_eq!(classify_poll(None), Err(EmptyPollReason::NoMessage));
        assert_eq!(
            classify_poll(Some(RawRecord::status_only(RecordStatus::PartitionEof))),
            Err(EmptyPollReason::PartitionEof)
        );
        assert_eq!(
            classify_poll(Some(RawRecord::status_only(RecordStatus::TimedOut))),
            Err(EmptyPollReason::TimedOut)
        );
        assert_eq!(
            classify_poll(Some(RawRecord::status_only(RecordStatus::BrokerError(
                "transport failure".to_string()
            )))),
            Err(EmptyPollReason::BrokerError("transport failure".to_string()))
        );
        assert_eq!(
            classify_poll(Some(RawRecord::new("orders", 0, 1, "x").without_payload())),
            Err(EmptyPollReason::NullPayload)
        );
        assert_eq!(
            classify_poll(Some(RawRecord::new("orders", 0, 1, Vec::<u8>::new()))),
            Err(EmptyPollReason::NullPayload)
        );
    }

    #[test]
    fn test_classify_record_with_payload() {
        let record = RawRecord::new("orders", 2, 10, "payload");
        assert_eq!(classify_poll(Some(record.clone())), Ok(record));
    }
}
