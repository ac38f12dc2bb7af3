use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use teloxide::types::{ChatId, MessageId};

use crate::bot::button::{Button, ButtonBuilder};
use crate::bot::callbacks::{callback_handler, CallbackOptions, CallbackRegistry, QueryIdScheme};
use crate::bot::commands::{
    command_handler, normalize_command, parse_command, CommandOptions, CommandRouter,
};
use crate::bot::traits::BotTransport;
use crate::bot::transport::TeloxideTransport;
use crate::bot::types::{CallbackEvent, IncomingMessage};
use crate::bot::HandlerResult;
use crate::error::{ErrorSeverity, Result, XgramError};
use crate::logger::{BotLogger, LogFacade};
use crate::utils::{Formatter, Validator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotOptions {
    pub token: String,
    pub polling: bool,
}

impl BotOptions {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            polling: true,
        }
    }
}

struct ClientInner {
    transport: Arc<dyn BotTransport>,
    commands: RwLock<CommandRouter>,
    callbacks: RwLock<CallbackRegistry>,
    logger: RwLock<Arc<dyn BotLogger>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// 处理器失败时按错误严重程度选择日志级别，低严重度只记警告
fn report_failure(logger: &dyn BotLogger, context: &str, error: &anyhow::Error) {
    let severity = error
        .downcast_ref::<XgramError>()
        .map(XgramError::severity)
        .unwrap_or(ErrorSeverity::High);

    let line = format!("{context} failed [{severity}]: {error:#}");
    match severity {
        ErrorSeverity::Low => logger.warn(&line),
        _ => logger.error(&line),
    }
}

/// 持有命令表、回调表和传输层的机器人客户端，克隆开销很小
#[derive(Clone)]
pub struct BotClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for BotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotClient")
            .field("commands", &self.command_count())
            .field("callbacks", &self.callback_count())
            .finish_non_exhaustive()
    }
}

impl BotClient {
    pub fn new(transport: Arc<dyn BotTransport>) -> Self {
        Self::with_scheme(transport, QueryIdScheme::default())
    }

    pub fn with_scheme(transport: Arc<dyn BotTransport>, scheme: QueryIdScheme) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                commands: RwLock::new(CommandRouter::new()),
                callbacks: RwLock::new(CallbackRegistry::new(scheme)),
                logger: RwLock::new(Arc::new(LogFacade)),
            }),
        }
    }

    /// 使用 teloxide 的 `Bot` 作为传输层
    pub fn from_token(options: &BotOptions) -> Self {
        Self::new(Arc::new(TeloxideTransport::from_token(&options.token)))
    }

    pub fn transport(&self) -> Arc<dyn BotTransport> {
        self.inner.transport.clone()
    }

    pub fn logger(&self) -> Arc<dyn BotLogger> {
        read(&self.inner.logger).clone()
    }

    pub fn set_logger(&self, logger: Arc<dyn BotLogger>) {
        *write(&self.inner.logger) = logger;
    }

    /// 注册命令处理器，同名命令只能注册一次
    pub fn command<F, Fut>(&self, name: &str, handler: F, options: CommandOptions) -> Result<()>
    where
        F: Fn(BotClient, IncomingMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let logger = self.logger();
        let name = normalize_command(name);
        if !Validator::is_valid_command_name(name) {
            logger.warn(&format!("Command name \"{name}\" will not be shown by Telegram clients"));
        }

        write(&self.inner.commands).register(name, command_handler(handler), options)?;
        logger.debug(&format!("Registered command /{name} ({:?})", options.mention));
        Ok(())
    }

    /// 注册回调处理器，返回按钮应携带的回调数据
    pub fn callback_query<F, Fut>(
        &self,
        key: &str,
        handler: F,
        options: CallbackOptions,
    ) -> Result<String>
    where
        F: Fn(BotClient, CallbackEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let query = write(&self.inner.callbacks).register(key, callback_handler(handler), options)?;
        self.logger()
            .debug(&format!("Registered callback query {key} as {query}"));
        Ok(query)
    }

    pub fn unique_key(&self) -> Result<String> {
        read(&self.inner.callbacks).unique_key()
    }

    pub fn button(&self) -> ButtonBuilder {
        ButtonBuilder::new(self.clone())
    }

    /// 注册时的写法也可以查询，例如 `/start`
    pub fn has_command(&self, name: &str) -> bool {
        read(&self.inner.commands).contains(normalize_command(name))
    }

    pub fn command_count(&self) -> usize {
        read(&self.inner.commands).len()
    }

    pub fn query_for(&self, key: &str) -> Option<String> {
        read(&self.inner.callbacks).query_for(key).map(str::to_owned)
    }

    pub fn callback_count(&self) -> usize {
        read(&self.inner.callbacks).len()
    }

    /// 处理一条消息：匹配第一个合适的命令并调用，其余情况静默忽略
    pub async fn handle_message(&self, message: IncomingMessage) {
        let logger = self.logger();

        let Some(text) = message.text() else {
            return;
        };
        let Some(parsed) = parse_command(text) else {
            return;
        };
        let name = parsed.name.to_string();
        let mention = parsed.mention.map(str::to_owned);

        if !read(&self.inner.commands).contains(&name) {
            logger.debug(&format!("No handler registered for /{name}"));
            return;
        }

        let mentioned = match mention {
            None => false,
            Some(mention) => match self.inner.transport.get_me().await {
                Ok(profile) if profile.username == mention => true,
                Ok(profile) => {
                    logger.debug(&format!(
                        "Ignoring /{name}@{mention}, this bot is {}",
                        Formatter::format_username(&profile.username)
                    ));
                    return;
                }
                Err(e) => {
                    logger.warn(&format!("Failed to resolve bot username for /{name}: {e}"));
                    return;
                }
            },
        };

        let handler = read(&self.inner.commands)
            .find(&name, mentioned)
            .map(|registered| registered.handler());
        let Some(handler) = handler else {
            logger.debug(&format!("No handler for /{name} accepts mentioned={mentioned}"));
            return;
        };

        logger.debug(&format!("Handling command /{name} in chat {}", message.chat_id));
        if let Err(e) = handler(self.clone(), message).await {
            report_failure(logger.as_ref(), &format!("Command /{name}"), &e);
        }
    }

    /// 处理回调查询：按回调数据找到处理器并调用，未知数据静默忽略
    pub async fn handle_callback_query(&self, event: CallbackEvent) {
        let logger = self.logger();

        let handler = read(&self.inner.callbacks).lookup(&event);
        let Some(handler) = handler else {
            logger.debug(&format!(
                "Ignoring callback query {} with data {:?}",
                event.id, event.data
            ));
            return;
        };

        let data = event.data.clone().unwrap_or_default();
        if let Err(e) = handler(self.clone(), event).await {
            report_failure(logger.as_ref(), &format!("Callback query {data}"), &e);
        }
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId> {
        Ok(self.inner.transport.send_message(chat_id, text).await?)
    }

    pub async fn send_message_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<Vec<Button>>,
    ) -> Result<MessageId> {
        Ok(self
            .inner
            .transport
            .send_message_with_buttons(chat_id, text, buttons)
            .await?)
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        Ok(self
            .inner
            .transport
            .answer_callback_query(callback_query_id)
            .await?)
    }
}
