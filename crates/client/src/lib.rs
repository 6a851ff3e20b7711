//! kbus-client - 消费循环与 producer 资源缓存
//!
//! - [`ConsumptionLoop`]：拉取 → 分类 → 重试/提交 → 事件 的消费循环
//! - [`ProducerResourceCache`]：按 producer 名称惰性构建并缓存四级资源
//! - [`ProducerClient`]：基于缓存的消息发布
//! - [`MessageFactory`]：按配置选择解码器

mod blacklist;
mod consumer;
mod decoder;
mod events;
mod producer;
mod producer_cache;

pub use blacklist::*;
pub use consumer::*;
pub use decoder::*;
pub use events::*;
pub use producer::*;
pub use producer_cache::*;
