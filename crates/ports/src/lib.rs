//! ports - 抽象 trait 层
//!
//! 消费循环与 producer 缓存所依赖的全部外部能力

mod blacklist;
mod consumer;
mod consumer_client;
mod decoder;
mod events;
mod message;
mod producer_backend;

pub use blacklist::*;
pub use consumer::*;
pub use consumer_client::*;
pub use decoder::*;
pub use events::*;
pub use message::*;
pub use producer_backend::*;
