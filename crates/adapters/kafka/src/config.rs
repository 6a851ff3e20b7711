//! Kafka 配置模块
//!
//! 把已解析配置转换为 librdkafka 客户端配置项

use kbus_config::{ClientRole, ResolvedConfiguration};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};

/// 全局配置工厂
///
/// 同一份已解析配置总是生成相同的配置项；`properties` 最后写入，可覆盖前面的任意项。
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaConfigurationFactory;

impl KafkaConfigurationFactory {
    pub fn new() -> Self {
        Self
    }

    /// 转换为 rdkafka ClientConfig 的配置项
    pub fn to_client_config_entries(
        &self,
        configuration: &ResolvedConfiguration,
    ) -> Vec<(String, String)> {
        let options = configuration.options();

        let mut entries = vec![
            ("bootstrap.servers".to_string(), options.brokers.join(",")),
            ("client.id".to_string(), configuration.name().to_string()),
        ];

        if configuration.role() == ClientRole::Consumer {
            entries.push(("group.id".to_string(), options.group_id.clone()));
            entries.push((
                "enable.auto.commit".to_string(),
                options.enable_auto_commit.to_string(),
            ));
            entries.push((
                "auto.commit.interval.ms".to_string(),
                options.auto_commit_interval_ms.to_string(),
            ));
            entries.push((
                "auto.offset.reset".to_string(),
                options.auto_offset_reset.clone(),
            ));
            entries.push((
                "enable.auto.offset.store".to_string(),
                options.enable_auto_offset_store.to_string(),
            ));
            // 分区读完时以记录状态上报
            entries.push(("enable.partition.eof".to_string(), "true".to_string()));
        }

        for (key, value) in &options.properties {
            entries.push((key.clone(), value.clone()));
        }

        entries
    }

    /// 构建 rdkafka ClientConfig
    pub fn create(&self, configuration: &ResolvedConfiguration) -> ClientConfig {
        let mut client_config = ClientConfig::new();

        for (key, value) in self.to_client_config_entries(configuration) {
            client_config.set(key, value);
        }

        client_config.set_log_level(log_level(configuration.options().log_level));
        client_config
    }
}

/// syslog 级别映射到 rdkafka 日志级别
pub fn log_level(level: i32) -> RDKafkaLogLevel {
    match level {
        i32::MIN..=0 => RDKafkaLogLevel::Emerg,
        1 => RDKafkaLogLevel::Alert,
        2 => RDKafkaLogLevel::Critical,
        3 => RDKafkaLogLevel::Error,
        4 => RDKafkaLogLevel::Warning,
        5 => RDKafkaLogLevel::Notice,
        6 => RDKafkaLogLevel::Info,
        _ => RDKafkaLogLevel::Debug,
    }
}
