//! 基础设施资源管理
//!
//! 统一组装命令共享的 Kafka 资源

use std::sync::Arc;

use kbus_adapter_kafka::{KafkaConfigurationFactory, KafkaConsumerFactory, KafkaProducerBackend};
use kbus_client::{
    ConsumptionLoop, FanOutEventSink, MessageFactory, MetricsEventSink, ProducerClient,
    ProducerResourceCache, TopicBlacklist, TracingEventSink,
};
use kbus_config::{AppConfig, ClientRole, ConfigurationResolver};
use tracing::info;

/// 基础设施资源容器
pub struct Infrastructure {
    /// 应用配置
    config: AppConfig,
    /// 配置解析器（进程内共享）
    resolver: Arc<ConfigurationResolver>,
    /// topic 黑名单
    blacklist: Arc<TopicBlacklist>,
    configuration_factory: KafkaConfigurationFactory,
}

impl Infrastructure {
    pub fn from_config(config: AppConfig) -> Self {
        let resolver = Arc::new(ConfigurationResolver::new(config.kafka.clone()));
        let blacklist = Arc::new(TopicBlacklist::from_settings(&config.kafka));

        info!(
            consumers = config.kafka.instance_names(ClientRole::Consumer).count(),
            producers = config.kafka.instance_names(ClientRole::Producer).count(),
            blacklisted_topics = config.kafka.blacklisted_topics.len(),
            "Kafka settings loaded"
        );

        Self {
            config,
            resolver,
            blacklist,
            configuration_factory: KafkaConfigurationFactory::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn resolver(&self) -> Arc<ConfigurationResolver> {
        self.resolver.clone()
    }

    /// 创建消费循环，事件同时写入日志和 metrics
    pub fn consumption_loop(&self) -> ConsumptionLoop<KafkaConsumerFactory> {
        let events = FanOutEventSink::new()
            .with(Arc::new(TracingEventSink))
            .with(Arc::new(MetricsEventSink));

        ConsumptionLoop::new(
            self.resolver(),
            KafkaConsumerFactory::new(self.configuration_factory),
            MessageFactory::new(),
        )
        .with_event_sink(Arc::new(events))
    }

    /// 创建 producer 客户端
    pub fn producer_client(&self) -> ProducerClient<KafkaProducerBackend> {
        let backend = Arc::new(KafkaProducerBackend::new(self.configuration_factory));

        ProducerClient::new(ProducerResourceCache::new(
            backend,
            self.resolver(),
            self.blacklist.clone(),
        ))
    }
}
