//! Decoder trait 定义

use kbus_config::ResolvedConfiguration;
use kbus_errors::MessageError;

use crate::{DomainMessage, RawRecord};

/// 将原始记录解码为领域消息
///
/// 解码失败应返回 [`MessageError::Validation`]
pub trait MessageDecoder: Send + Sync {
    fn decode(
        &self,
        record: &RawRecord,
        configuration: &ResolvedConfiguration,
    ) -> Result<DomainMessage, MessageError>;
}
