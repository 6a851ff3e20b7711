//! Topic 黑名单

use std::collections::HashSet;

use kbus_config::KafkaSettings;
use kbus_ports::BlacklistPolicy;

/// 按名称精确匹配的 topic 黑名单
#[derive(Debug, Clone, Default)]
pub struct TopicBlacklist {
    topics: HashSet<String>,
}

impl TopicBlacklist {
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_settings(settings: &KafkaSettings) -> Self {
        Self::new(settings.blacklisted_topics.iter().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl BlacklistPolicy for TopicBlacklist {
    fn is_blacklisted(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }
}
