//! kbus-config - 配置加载库
//!
//! 配置分四层合并（优先级由低到高）：
//! 内置默认值 → kafka 全局 → consumers/producers 分组 → 实例 → 运行时覆盖

mod kafka;
mod options;
mod resolver;

pub use kafka::*;
pub use options::*;
pub use resolver::*;

use std::net::SocketAddr;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use kbus_errors::AppError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("No {role} named '{name}' is configured")]
    UnknownClient { role: ClientRole, name: String },

    #[error("Invalid configuration for {role} '{name}': {reason}")]
    Invalid {
        role: ClientRole,
        name: String,
        reason: String,
    },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownClient { .. } => AppError::not_found(err.to_string()),
            _ => AppError::configuration(err.to_string()),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Prometheus 抓取地址，未配置时不启动 HTTP 监听
    #[serde(default)]
    pub metrics_listen: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_listen: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_app_name() -> String {
    "kbus".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub kafka: KafkaSettings,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("KBUS_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// 从 TOML 字符串加载（不读取环境变量）
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(Figment::new().merge(Toml::string(toml)).extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
