//! Producer 后端 trait 定义

use std::time::Duration;

use async_trait::async_trait;
use kbus_config::ResolvedConfiguration;
use kbus_errors::AppResult;

use crate::OutboundMessage;

/// producer 资源的构建与发布能力
///
/// 依赖链：已解析配置 → 客户端配置 → 客户端 → topic 句柄
#[async_trait]
pub trait ProducerBackend: Send + Sync {
    type ClientConfig: Send + Sync;
    type Client: Send + Sync;
    type Topic: Send + Sync;

    fn create_client_config(
        &self,
        configuration: &ResolvedConfiguration,
    ) -> AppResult<Self::ClientConfig>;

    fn create_client(&self, config: &Self::ClientConfig) -> AppResult<Self::Client>;

    fn new_topic(
        &self,
        client: &Self::Client,
        name: &str,
        configuration: &ResolvedConfiguration,
    ) -> AppResult<Self::Topic>;

    async fn publish(
        &self,
        client: &Self::Client,
        topic: &Self::Topic,
        message: &OutboundMessage,
    ) -> AppResult<()>;

    fn flush(&self, client: &Self::Client, timeout: Duration) -> AppResult<()>;
}
