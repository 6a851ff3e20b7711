//! kbus-bootstrap - `kbus` 命令行启动骨架
//!
//! 加载配置、初始化日志与 metrics、组装 Kafka 资源并运行 consume / produce 命令

mod cli;
mod handler;
mod infrastructure;
mod runtime;
mod shutdown;
mod starter;

pub use cli::*;
pub use handler::*;
pub use infrastructure::*;
pub use runtime::*;
pub use shutdown::*;
pub use starter::*;
