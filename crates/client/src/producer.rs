//! Producer 客户端
//!
//! 把一条消息发布到 producer 配置的全部 topic

use std::time::Duration;

use kbus_errors::AppResult;
use kbus_ports::{OutboundMessage, ProducerBackend};
use tracing::{debug, error};

use crate::ProducerResourceCache;

pub struct ProducerClient<B: ProducerBackend> {
    cache: ProducerResourceCache<B>,
}

impl<B: ProducerBackend> ProducerClient<B> {
    pub fn new(cache: ProducerResourceCache<B>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ProducerResourceCache<B> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ProducerResourceCache<B> {
        &mut self.cache
    }

    /// 按声明顺序发布到每个 topic，遇到第一个失败即返回
    pub async fn produce(&mut self, producer: &str, message: &OutboundMessage) -> AppResult<()> {
        let resources = self.cache.resources(producer)?;
        let backend = self.cache.backend();

        for (name, topic) in resources
            .configuration
            .topics()
            .iter()
            .zip(resources.topics.iter())
        {
            backend
                .publish(&resources.client, topic, message)
                .await
                .inspect_err(|e| {
                    error!(producer, topic = %name, error = %e, "Failed to publish message");
                })?;

            debug!(
                producer,
                topic = %name,
                payload_bytes = message.payload.len(),
                keyed = message.key.is_some(),
                "Message published"
            );
        }

        Ok(())
    }

    /// 刷新该 producer 客户端中待发送的消息
    pub fn flush(&mut self, producer: &str, timeout: Duration) -> AppResult<()> {
        let client = self.cache.client(producer)?;
        self.cache.backend().flush(&client, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use kbus_config::{AppConfig, ConfigurationResolver, ResolvedConfiguration};
    use kbus_errors::AppError;

    use crate::TopicBlacklist;

    #[derive(Default)]
    struct RecordingBackend {
        published: Mutex<Vec<(String, OutboundMessage)>>,
        flushed: Mutex<Vec<Duration>>,
        fail_topic: Option<String>,
    }

    #[async_trait]
    impl ProducerBackend for RecordingBackend {
        type ClientConfig = ();
        type Client = ();
        type Topic = String;

        fn create_client_config(
            &self,
            _configuration: &ResolvedConfiguration,
        ) -> AppResult<Self::ClientConfig> {
            Ok(())
        }

        fn create_client(&self, _config: &Self::ClientConfig) -> AppResult<Self::Client> {
            Ok(())
        }

        fn new_topic(
            &self,
            _client: &Self::Client,
            name: &str,
            _configuration: &ResolvedConfiguration,
        ) -> AppResult<Self::Topic> {
            Ok(name.to_string())
        }

        async fn publish(
            &self,
            _client: &Self::Client,
            topic: &Self::Topic,
            message: &OutboundMessage,
        ) -> AppResult<()> {
            if self.fail_topic.as_deref() == Some(topic.as_str()) {
                return Err(AppError::broker("queue full"));
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.clone(), message.clone()));
            Ok(())
        }

        fn flush(&self, _client: &Self::Client, timeout: Duration) -> AppResult<()> {
            self.flushed.lock().unwrap().push(timeout);
            Ok(())
        }
    }

    fn client(backend: Arc<RecordingBackend>) -> ProducerClient<RecordingBackend> {
        let config = AppConfig::from_toml_str(
            r#"
            [kafka.producers.instances.events]
            topics = ["events", "events.archive", "events.replica"]
            "#,
        )
        .unwrap();
        let resolver = Arc::new(ConfigurationResolver::new(config.kafka));

        ProducerClient::new(ProducerResourceCache::new(
            backend,
            resolver,
            Arc::new(TopicBlacklist::default()),
        ))
    }

    #[tokio::test]
    async fn test_produce_to_every_topic_in_order() {
        let backend = Arc::new(RecordingBackend::default());
        let mut producer = client(backend.clone());
        let message = OutboundMessage::new("hello").with_key("user-1");

        producer.produce("events", &message).await.unwrap();
        producer.produce("events", &message).await.unwrap();
        producer.flush("events", Duration::from_secs(1)).unwrap();

        let published = backend.published.lock().unwrap();
        let topics: Vec<_> = published.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "events",
                "events.archive",
                "events.replica",
                "events",
                "events.archive",
                "events.replica"
            ]
        );
        assert!(published.iter().all(|(_, m)| m == &message));
        assert_eq!(*backend.flushed.lock().unwrap(), vec![Duration::from_secs(1)]);
        assert_eq!(producer.cache().cached_clients(), 1);
    }

    #[tokio::test]
    async fn test_produce_stops_at_first_failure() {
        let backend = Arc::new(RecordingBackend {
            fail_topic: Some("events.archive".to_string()),
            ..RecordingBackend::default()
        });
        let mut producer = client(backend.clone());

        let err = producer
            .produce("events", &OutboundMessage::new("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Broker(_)));
        let published = backend.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "events");
    }
}
