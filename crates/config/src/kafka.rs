//! Kafka 配置树
//!
//! 全局、分组、实例三层原样保存为键值表，按名称解析时再合并

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::ClientRole;

/// 未解析的选项表
pub type OptionTable = BTreeMap<String, Value>;

/// consumers / producers 分组配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupSettings {
    /// 分组级选项，对该分组下所有实例生效
    #[serde(flatten)]
    pub common: OptionTable,
    /// 实例级选项，按实例名索引
    #[serde(default)]
    pub instances: BTreeMap<String, OptionTable>,
}

/// `[kafka]` 配置段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KafkaSettings {
    /// 禁止 producer 发布的 topic
    #[serde(default)]
    pub blacklisted_topics: Vec<String>,
    #[serde(default)]
    pub consumers: GroupSettings,
    #[serde(default)]
    pub producers: GroupSettings,
    /// 全局选项，对所有 consumer 和 producer 生效
    #[serde(flatten)]
    pub global: OptionTable,
}

impl KafkaSettings {
    pub fn group(&self, role: ClientRole) -> &GroupSettings {
        match role {
            ClientRole::Consumer => &self.consumers,
            ClientRole::Producer => &self.producers,
        }
    }

    /// 已声明的实例名
    pub fn instance_names(&self, role: ClientRole) -> impl Iterator<Item = &str> {
        self.group(role).instances.keys().map(String::as_str)
    }
}
