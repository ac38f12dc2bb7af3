use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use crate::bot::client::BotClient;
use crate::bot::types::CallbackEvent;
use crate::bot::HandlerResult;
use crate::error::{Result, XgramError};
use crate::utils::{generate_random_string, DEFAULT_KEY_LENGTH};

pub type CallbackHandler =
    Arc<dyn Fn(BotClient, CallbackEvent) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

pub fn callback_handler<F, Fut>(handler: F) -> CallbackHandler
where
    F: Fn(BotClient, CallbackEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |client: BotClient, event: CallbackEvent| {
        handler(client, event).boxed()
    })
}

/// 回调标识符的生成方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIdScheme {
    /// "0", "1", "2" ... 跳过已占用的值
    Sequential,
    /// 10 位随机字母数字，重启后不会复用旧按钮的标识符
    #[default]
    Random,
}

impl FromStr for QueryIdScheme {
    type Err = XgramError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(QueryIdScheme::Sequential),
            "random" => Ok(QueryIdScheme::Random),
            other => Err(XgramError::Config(anyhow::anyhow!(
                "Unknown callback id scheme: {}",
                other
            ))),
        }
    }
}

/// 目前没有可配置项，保留给以后扩展
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackOptions {}

#[derive(Clone)]
pub struct CallbackEntry {
    pub key: String,
    pub query: String,
    pub options: CallbackOptions,
    handler: CallbackHandler,
}

impl CallbackEntry {
    pub fn handler(&self) -> CallbackHandler {
        self.handler.clone()
    }
}

impl fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("key", &self.key)
            .field("query", &self.query)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// 数字标识符加一
pub fn next_query(query: &str) -> Result<String> {
    let number = query
        .parse::<u64>()
        .map_err(|_| XgramError::malformed_identifier(query))?;
    number
        .checked_add(1)
        .map(|next| next.to_string())
        .ok_or_else(|| XgramError::malformed_identifier(query))
}

#[derive(Debug, Default, Clone)]
pub struct CallbackRegistry {
    entries: Vec<CallbackEntry>,
    scheme: QueryIdScheme,
}

impl CallbackRegistry {
    pub fn new(scheme: QueryIdScheme) -> Self {
        Self {
            entries: Vec::new(),
            scheme,
        }
    }

    /// 注册处理器并返回分配给它的标识符
    pub fn register(
        &mut self,
        key: &str,
        handler: CallbackHandler,
        options: CallbackOptions,
    ) -> Result<String> {
        if self.contains_key(key) {
            return Err(XgramError::duplicate_callback_key(key));
        }

        let query = match self.scheme {
            QueryIdScheme::Sequential => self.allocate_sequential()?,
            QueryIdScheme::Random => self.allocate_random()?,
        };

        self.entries.push(CallbackEntry {
            key: key.to_string(),
            query: query.clone(),
            options,
            handler,
        });
        Ok(query)
    }

    fn allocate_sequential(&self) -> Result<String> {
        let mut query = self
            .entries
            .last()
            .map(|entry| entry.query.clone())
            .unwrap_or_else(|| "0".to_string());

        while self.contains_query(&query) {
            query = next_query(&query)?;
        }
        Ok(query)
    }

    fn allocate_random(&self) -> Result<String> {
        loop {
            let query = generate_random_string(DEFAULT_KEY_LENGTH)?;
            if !self.contains_query(&query) {
                return Ok(query);
            }
        }
    }

    /// 生成一个尚未被使用的随机键
    pub fn unique_key(&self) -> Result<String> {
        loop {
            let key = generate_random_string(DEFAULT_KEY_LENGTH)?;
            if !self.contains_key(&key) {
                return Ok(key);
            }
        }
    }

    /// 根据事件携带的数据查找处理器，没有数据或未注册时返回 `None`
    pub fn lookup(&self, event: &CallbackEvent) -> Option<CallbackHandler> {
        let data = event.data()?;
        self.entries
            .iter()
            .find(|entry| entry.query == data)
            .map(CallbackEntry::handler)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    pub fn contains_query(&self, query: &str) -> bool {
        self.entries.iter().any(|entry| entry.query == query)
    }

    pub fn query_for(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.query.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
