//! 配置解析器
//!
//! 按 (角色, 名称) 合并各层选项，生成不可变的 [`ResolvedConfiguration`]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use figment::{Figment, providers::Serialized};
use kbus_common::RetryPolicy;
use serde_json::Value;
use tracing::debug;

use crate::{ClientOptions, ConfigError, KafkaSettings, OptionTable};

/// 客户端角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    Consumer,
    Producer,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Consumer => "consumer",
            ClientRole::Producer => "producer",
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 运行时覆盖（如命令行参数），优先级最高
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    values: OptionTable,
}

impl RuntimeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, option: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(option.into(), value.into());
        self
    }

    /// 仅在有值时设置
    pub fn set_opt<V: Into<Value>>(self, option: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(option, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 已解析配置
///
/// 针对单个具名 consumer 或 producer，创建后只读
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfiguration {
    name: String,
    role: ClientRole,
    options: ClientOptions,
}

impl ResolvedConfiguration {
    /// 直接由选项构造（跳过分层合并，但仍做校验）
    pub fn new(
        role: ClientRole,
        name: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        options.validate().map_err(|reason| ConfigError::Invalid {
            role,
            name: name.clone(),
            reason,
        })?;

        Ok(Self {
            name,
            role,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> ClientRole {
        self.role
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn topics(&self) -> &[String] {
        &self.options.topics
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.options.retry_policy()
    }

    pub fn auto_commit_enabled(&self) -> bool {
        self.options.enable_auto_commit
    }

    pub fn decoder(&self) -> &str {
        &self.options.decoder
    }
}

/// 配置解析器
///
/// 无运行时覆盖的解析结果按 (角色, 名称) 缓存，进程内复用同一实例。
pub struct ConfigurationResolver {
    settings: KafkaSettings,
    resolved: Mutex<HashMap<(ClientRole, String), Arc<ResolvedConfiguration>>>,
}

impl ConfigurationResolver {
    pub fn new(settings: KafkaSettings) -> Self {
        Self {
            settings,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &KafkaSettings {
        &self.settings
    }

    pub fn resolve_consumer(
        &self,
        name: &str,
        overrides: Option<&RuntimeOverrides>,
    ) -> Result<Arc<ResolvedConfiguration>, ConfigError> {
        self.resolve(ClientRole::Consumer, name, overrides)
    }

    pub fn resolve_producer(
        &self,
        name: &str,
        overrides: Option<&RuntimeOverrides>,
    ) -> Result<Arc<ResolvedConfiguration>, ConfigError> {
        self.resolve(ClientRole::Producer, name, overrides)
    }

    /// 解析配置
    ///
    /// 带覆盖的解析每次重新合并，不写入缓存。
    pub fn resolve(
        &self,
        role: ClientRole,
        name: &str,
        overrides: Option<&RuntimeOverrides>,
    ) -> Result<Arc<ResolvedConfiguration>, ConfigError> {
        let overrides = overrides.filter(|o| !o.is_empty());

        if let Some(overrides) = overrides {
            return self.build(role, name, Some(overrides)).map(Arc::new);
        }

        let key = (role, name.to_string());
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(configuration) = resolved.get(&key) {
            return Ok(Arc::clone(configuration));
        }

        let configuration = Arc::new(self.build(role, name, None)?);
        resolved.insert(key, Arc::clone(&configuration));

        Ok(configuration)
    }

    fn build(
        &self,
        role: ClientRole,
        name: &str,
        overrides: Option<&RuntimeOverrides>,
    ) -> Result<ResolvedConfiguration, ConfigError> {
        let group = self.settings.group(role);
        let instance = group
            .instances
            .get(name)
            .ok_or_else(|| ConfigError::UnknownClient {
                role,
                name: name.to_string(),
            })?;

        let mut figment = Figment::from(Serialized::defaults(ClientOptions::default()))
            .merge(Serialized::defaults(&self.settings.global))
            .merge(Serialized::defaults(&group.common))
            .merge(Serialized::defaults(instance));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(&overrides.values));
        }

        let options: ClientOptions = figment.extract()?;

        debug!(role = %role, name, topics = ?options.topics, "Configuration resolved");

        ResolvedConfiguration::new(role, name, options)
    }
}
