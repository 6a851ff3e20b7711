//! 消息解码
//!
//! 内置 `plain` 与 `json` 两种解码器，按配置中的 `decoder` 名称选择

use std::collections::HashMap;
use std::sync::Arc;

use kbus_config::ResolvedConfiguration;
use kbus_errors::{AppError, MessageError};
use kbus_ports::{DomainMessage, MessageDecoder, RawRecord};

fn base_message(record: &RawRecord) -> Result<DomainMessage, MessageError> {
    let payload = record
        .payload
        .clone()
        .ok_or_else(|| MessageError::validation("Record has no payload"))?;

    Ok(DomainMessage {
        topic: record.topic.clone(),
        partition: record.partition,
        offset: record.offset,
        timestamp: record.timestamp,
        key: record.key.clone(),
        payload,
        decoded: None,
    })
}

/// 原样传递负载
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDecoder;

impl MessageDecoder for PlainDecoder {
    fn decode(
        &self,
        record: &RawRecord,
        _configuration: &ResolvedConfiguration,
    ) -> Result<DomainMessage, MessageError> {
        base_message(record)
    }
}

/// 负载必须是合法 JSON，解析结果附加到 `decoded`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl MessageDecoder for JsonDecoder {
    fn decode(
        &self,
        record: &RawRecord,
        _configuration: &ResolvedConfiguration,
    ) -> Result<DomainMessage, MessageError> {
        let mut message = base_message(record)?;
        let document = serde_json::from_slice(&message.payload)
            .map_err(|e| MessageError::validation(format!("Payload is not valid JSON: {}", e)))?;
        message.decoded = Some(document);
        Ok(message)
    }
}

/// 消息工厂
pub struct MessageFactory {
    decoders: HashMap<String, Arc<dyn MessageDecoder>>,
}

impl MessageFactory {
    /// 仅含内置解码器
    pub fn new() -> Self {
        Self::empty()
            .with_decoder("plain", Arc::new(PlainDecoder))
            .with_decoder("json", Arc::new(JsonDecoder))
    }

    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// 注册解码器，同名覆盖
    pub fn with_decoder(mut self, name: impl Into<String>, decoder: Arc<dyn MessageDecoder>) -> Self {
        self.decoders.insert(name.into(), decoder);
        self
    }

    /// 解码一条记录
    ///
    /// 配置了未注册的解码器属于配置错误，返回 `Fatal`
    pub fn create(
        &self,
        record: &RawRecord,
        configuration: &ResolvedConfiguration,
    ) -> Result<DomainMessage, MessageError> {
        let decoder = self.decoders.get(configuration.decoder()).ok_or_else(|| {
            MessageError::fatal(AppError::configuration(format!(
                "Unknown decoder '{}' for consumer '{}'",
                configuration.decoder(),
                configuration.name()
            )))
        })?;

        decoder.decode(record, configuration)
    }
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbus_config::{ClientOptions, ClientRole};

    fn configuration(decoder: &str) -> ResolvedConfiguration {
        let options = ClientOptions {
            topics: vec!["orders".to_string()],
            decoder: decoder.to_string(),
            ..ClientOptions::default()
        };
        ResolvedConfiguration::new(ClientRole::Consumer, "orders", options).unwrap()
    }

    #[test]
    fn test_plain_keeps_record_fields() {
        let record = RawRecord::new("orders", 3, 42, "hello")
            .with_key("k")
            .with_timestamp(1_700_000_000_000);

        let message = MessageFactory::new()
            .create(&record, &configuration("plain"))
            .unwrap();

        assert_eq!(message.topic, "orders");
        assert_eq!(message.partition, 3);
        assert_eq!(message.offset, 42);
        assert_eq!(message.payload_str(), Some("hello"));
        assert_eq!(message.key_str(), Some("k"));
        assert_eq!(message.timestamp, Some(1_700_000_000_000));
        assert!(message.decoded.is_none());
    }

    #[test]
    fn test_json_attaches_document() {
        let record = RawRecord::new("orders", 0, 1, r#"{"id": 9}"#);

        let message = MessageFactory::new()
            .create(&record, &configuration("json"))
            .unwrap();

        assert_eq!(message.decoded, Some(serde_json::json!({"id": 9})));
    }

    #[test]
    fn test_json_rejects_malformed_payload() {
        let record = RawRecord::new("orders", 0, 1, "{broken");

        let err = MessageFactory::new()
            .create(&record, &configuration("json"))
            .unwrap_err();

        assert!(matches!(err, MessageError::Validation(_)));
    }

    #[test]
    fn test_missing_payload_is_validation() {
        let record = RawRecord::new("orders", 0, 1, "x").without_payload();

        let err = PlainDecoder
            .decode(&record, &configuration("plain"))
            .unwrap_err();

        assert!(matches!(err, MessageError::Validation(_)));
    }

    #[test]
    fn test_unknown_decoder_is_fatal() {
        let record = RawRecord::new("orders", 0, 1, "x");

        let err = MessageFactory::new()
            .create(&record, &configuration("avro"))
            .unwrap_err();

        assert!(matches!(err, MessageError::Fatal(AppError::Configuration(_))));
    }
}
