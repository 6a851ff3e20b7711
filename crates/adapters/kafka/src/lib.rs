//! adapter-kafka - Kafka 适配器
//!
//! - 全局配置工厂：已解析配置 → librdkafka 配置项
//! - 消费端客户端（`StreamConsumer`）
//! - producer 后端（`FutureProducer`）

mod config;
mod consumer;
mod producer;

pub use config::*;
pub use consumer::*;
pub use producer::*;
