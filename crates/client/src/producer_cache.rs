//! Producer 资源缓存
//!
//! 四级资源按 producer 名称惰性构建，每级只构建一次并缓存到进程结束：
//!
//! ```text
//! 已解析配置 → 客户端配置 → 客户端 → topic 句柄列表
//! ```
//!
//! 每级的构建函数只接收上一级的缓存值。请求任意一级时缺失的前置级会被级联构建，
//! 调用方无需按顺序请求。缓存不淘汰、不刷新：键来自进程配置而非外部输入。
//!
//! 访问器都需要 `&mut self`，同一时刻只有一个调用方能执行"检查-构建-写入"。
//! 需要跨任务共享时由调用方包一层 `tokio::sync::Mutex`。

use std::collections::HashMap;
use std::sync::Arc;

use kbus_config::{ConfigurationResolver, ResolvedConfiguration, RuntimeOverrides};
use kbus_errors::{AppError, AppResult};
use kbus_ports::{BlacklistPolicy, ProducerBackend};
use tracing::{debug, error};

/// 按 producer 名称索引的单级缓存
struct Memo<V> {
    entries: HashMap<String, V>,
}

impl<V: Clone> Memo<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn get(&self, producer: &str) -> Option<V> {
        self.entries.get(producer).cloned()
    }

    fn insert(&mut self, producer: &str, value: V) -> V {
        self.entries.insert(producer.to_string(), value.clone());
        value
    }

    /// 构建失败时不写入缓存，下次请求会重新构建
    fn get_or_try_insert_with(
        &mut self,
        producer: &str,
        build: impl FnOnce() -> AppResult<V>,
    ) -> AppResult<V> {
        if let Some(value) = self.get(producer) {
            return Ok(value);
        }
        let value = build()?;
        Ok(self.insert(producer, value))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// 单个 producer 的全部资源
pub struct ProducerResourceSet<B: ProducerBackend> {
    pub configuration: Arc<ResolvedConfiguration>,
    pub client_config: Arc<B::ClientConfig>,
    pub client: Arc<B::Client>,
    pub topics: Arc<Vec<B::Topic>>,
}

impl<B: ProducerBackend> Clone for ProducerResourceSet<B> {
    fn clone(&self) -> Self {
        Self {
            configuration: Arc::clone(&self.configuration),
            client_config: Arc::clone(&self.client_config),
            client: Arc::clone(&self.client),
            topics: Arc::clone(&self.topics),
        }
    }
}

/// Producer 资源缓存
pub struct ProducerResourceCache<B: ProducerBackend> {
    backend: Arc<B>,
    resolver: Arc<ConfigurationResolver>,
    blacklist: Arc<dyn BlacklistPolicy>,
    configurations: Memo<Arc<ResolvedConfiguration>>,
    client_configs: Memo<Arc<B::ClientConfig>>,
    clients: Memo<Arc<B::Client>>,
    topics: Memo<Arc<Vec<B::Topic>>>,
}

impl<B: ProducerBackend> ProducerResourceCache<B> {
    pub fn new(
        backend: Arc<B>,
        resolver: Arc<ConfigurationResolver>,
        blacklist: Arc<dyn BlacklistPolicy>,
    ) -> Self {
        Self {
            backend,
            resolver,
            blacklist,
            configurations: Memo::new(),
            client_configs: Memo::new(),
            clients: Memo::new(),
            topics: Memo::new(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// 第一级：已解析配置
    ///
    /// 覆盖项只在首次解析该 producer 时生效。
    pub fn resolved_configuration(
        &mut self,
        producer: &str,
        overrides: Option<&RuntimeOverrides>,
    ) -> AppResult<Arc<ResolvedConfiguration>> {
        let resolver = &self.resolver;
        self.configurations.get_or_try_insert_with(producer, || {
            debug!(producer, "Resolving producer configuration");
            Ok(resolver.resolve_producer(producer, overrides)?)
        })
    }

    /// 第二级：客户端配置
    pub fn client_config(&mut self, producer: &str) -> AppResult<Arc<B::ClientConfig>> {
        let configuration = self.resolved_configuration(producer, None)?;
        let backend = &self.backend;
        self.client_configs.get_or_try_insert_with(producer, || {
            debug!(producer, "Building producer client configuration");
            backend.create_client_config(&configuration).map(Arc::new)
        })
    }

    /// 第三级：客户端
    pub fn client(&mut self, producer: &str) -> AppResult<Arc<B::Client>> {
        let client_config = self.client_config(producer)?;
        let backend = &self.backend;
        self.clients.get_or_try_insert_with(producer, || {
            debug!(producer, "Creating producer client");
            backend.create_client(&client_config).map(Arc::new)
        })
    }

    /// 第四级：topic 句柄列表
    ///
    /// 黑名单在创建客户端和任何句柄之前检查，命中即失败。
    pub fn topics(&mut self, producer: &str) -> AppResult<Arc<Vec<B::Topic>>> {
        if let Some(topics) = self.topics.get(producer) {
            return Ok(topics);
        }

        let configuration = self.resolved_configuration(producer, None)?;
        if let Some(topic) = configuration
            .topics()
            .iter()
            .find(|topic| self.blacklist.is_blacklisted(topic))
        {
            error!(producer, topic = %topic, "Producer topic is blacklisted");
            return Err(AppError::blacklisted(topic.clone()));
        }

        let client = self.client(producer)?;
        let handles = configuration
            .topics()
            .iter()
            .map(|name| self.backend.new_topic(&client, name, &configuration))
            .collect::<AppResult<Vec<_>>>()?;

        debug!(producer, topics = ?configuration.topics(), "Producer topics created");

        Ok(self.topics.insert(producer, Arc::new(handles)))
    }

    /// 一次取齐四级资源
    pub fn resources(&mut self, producer: &str) -> AppResult<ProducerResourceSet<B>> {
        let topics = self.topics(producer)?;

        Ok(ProducerResourceSet {
            configuration: self.resolved_configuration(producer, None)?,
            client_config: self.client_config(producer)?,
            client: self.client(producer)?,
            topics,
        })
    }

    /// 已缓存客户端的 producer 数量
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }
}
