//! kbus - Kafka consume/produce 命令行入口

use std::time::Duration;

use clap::Parser;
use kbus_bootstrap::{Cli, Command, run_consumer, run_producer};
use kbus_ports::OutboundMessage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Consume(args) => {
            run_consumer(&cli.config_dir, &args.consumer, args.overrides()).await
        }
        Command::Produce(args) => {
            let mut message = OutboundMessage::new(args.payload);
            if let Some(key) = args.key {
                message = message.with_key(key);
            }
            run_producer(
                &cli.config_dir,
                &args.producer,
                message,
                Duration::from_millis(args.flush_timeout),
            )
            .await
        }
    }
}
