//! 消息类型

use kbus_errors::MessageError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 解码后的领域消息
///
/// 由单个重试序列独占，创建后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct DomainMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: Option<i64>,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    /// 解码器附加的结构化内容
    pub decoded: Option<Value>,
}

impl DomainMessage {
    /// 负载的 UTF-8 视图
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// 键的 UTF-8 视图
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_deref().and_then(|k| std::str::from_utf8(k).ok())
    }

    /// 解析 JSON 负载
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        let parsed = match &self.decoded {
            Some(value) => serde_json::from_value(value.clone()),
            None => serde_json::from_slice(&self.payload),
        };

        parsed.map_err(|e| MessageError::validation(format!("Failed to parse payload: {}", e)))
    }
}

/// 待发布的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub payload: Vec<u8>,
    pub key: Option<Vec<u8>>,
}

impl OutboundMessage {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }
}
