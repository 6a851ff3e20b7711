//! 命令行参数

use clap::{Args, Parser, Subcommand};
use kbus_config::RuntimeOverrides;

#[derive(Parser, Debug)]
#[command(name = "kbus", version, about = "Kafka consume/produce runner")]
pub struct Cli {
    /// 配置目录（default.toml 与 <APP_ENV>.toml 所在目录）
    #[arg(long, global = true, env = "KBUS_CONFIG_DIR", default_value = "config")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a named consumer until interrupted
    Consume(ConsumeArgs),
    /// Publish one message through a named producer
    Produce(ProduceArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConsumeArgs {
    /// Consumer name as configured under kafka.consumers.instances
    pub consumer: String,

    /// Poll timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries after the first attempt
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Initial retry delay in milliseconds
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Upper bound for the retry delay in milliseconds
    #[arg(long)]
    pub max_retry_delay: Option<u64>,

    /// Factor applied to the delay after each failed attempt
    #[arg(long)]
    pub retry_multiplier: Option<f64>,
}

impl ConsumeArgs {
    /// 命令行参数作为运行时覆盖项
    pub fn overrides(&self) -> RuntimeOverrides {
        RuntimeOverrides::new()
            .set_opt("timeout", self.timeout)
            .set_opt("max_retries", self.max_retries)
            .set_opt("retry_delay", self.retry_delay)
            .set_opt("max_retry_delay", self.max_retry_delay)
            .set_opt("retry_multiplier", self.retry_multiplier)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProduceArgs {
    /// Producer name as configured under kafka.producers.instances
    pub producer: String,

    /// Message payload
    pub payload: String,

    /// Message key
    #[arg(short, long)]
    pub key: Option<String>,

    /// Flush timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub flush_timeout: u64,
}
