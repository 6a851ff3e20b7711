//! 命令启动器
//!
//! 提供 consume / produce 两个命令的统一启动流程

use std::time::Duration;

use kbus_config::{AppConfig, RuntimeOverrides};
use kbus_ports::OutboundMessage;
use tracing::{error, info};

use crate::handler::LoggingConsumer;
use crate::infrastructure::Infrastructure;
use crate::runtime::init_runtime;
use crate::shutdown::ShutdownController;

type BoxError = Box<dyn std::error::Error>;

fn bootstrap(config_dir: &str) -> Result<Infrastructure, BoxError> {
    // 1. 加载配置
    let config = AppConfig::load(config_dir)?;

    // 2. 初始化运行时
    init_runtime(&config)?;

    // 3. 创建基础设施
    Ok(Infrastructure::from_config(config))
}

/// 运行具名 consumer，直到收到关闭信号或出现致命错误
pub async fn run_consumer(
    config_dir: &str,
    consumer: &str,
    overrides: RuntimeOverrides,
) -> Result<(), BoxError> {
    let infra = bootstrap(config_dir)?;
    info!(app_name = %infra.config().app_name, consumer, "Starting consumer");

    // 4. 信号触发取消
    let shutdown = ShutdownController::new();
    let signal_handle = shutdown.listen_for_signals();

    // 5. 运行消费循环
    let handler = LoggingConsumer::new(consumer);
    let mut consumption = infra.consumption_loop();
    let overrides = (!overrides.is_empty()).then_some(&overrides);
    let result = consumption
        .consume(&handler, overrides, &shutdown.token())
        .await;

    // 6. 清理
    signal_handle.abort();

    if let Err(e) = &result {
        error!(consumer, error = %e, "Consumer failed");
    }
    info!(
        consumer,
        consumed_messages = consumption.metrics().consumed_messages,
        "Consumer exited"
    );

    Ok(result?)
}

/// 通过具名 producer 发布一条消息并刷新
pub async fn run_producer(
    config_dir: &str,
    producer: &str,
    message: OutboundMessage,
    flush_timeout: Duration,
) -> Result<(), BoxError> {
    let infra = bootstrap(config_dir)?;
    info!(app_name = %infra.config().app_name, producer, "Starting producer");

    let mut client = infra.producer_client();
    client.produce(producer, &message).await?;
    client.flush(producer, flush_timeout)?;

    info!(
        producer,
        payload_bytes = message.payload.len(),
        "Message produced"
    );
    Ok(())
}
