use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::bot::client::BotClient;
use crate::bot::types::IncomingMessage;
use crate::bot::HandlerResult;
use crate::error::{Result, XgramError};

pub type CommandHandler =
    Arc<dyn Fn(BotClient, IncomingMessage) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// 把异步闭包包装成可存入路由表的处理器
pub fn command_handler<F, Fut>(handler: F) -> CommandHandler
where
    F: Fn(BotClient, IncomingMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |client: BotClient, message: IncomingMessage| {
        handler(client, message).boxed()
    })
}

/// 命令处理器对 `@botname` 后缀的要求
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MentionPolicy {
    /// 必须带 `@botname`
    OnlyWith,
    /// 不能带 `@botname`
    OnlyWithout,
    #[default]
    Both,
}

impl MentionPolicy {
    pub fn allows(&self, mentioned: bool) -> bool {
        match self {
            MentionPolicy::OnlyWith => mentioned,
            MentionPolicy::OnlyWithout => !mentioned,
            MentionPolicy::Both => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub mention: MentionPolicy,
}

impl CommandOptions {
    pub fn with_mention(mention: MentionPolicy) -> Self {
        Self { mention }
    }
}

#[derive(Clone)]
pub struct RegisteredCommand {
    pub command: String,
    pub options: CommandOptions,
    handler: CommandHandler,
}

impl RegisteredCommand {
    pub fn handler(&self) -> CommandHandler {
        self.handler.clone()
    }

    fn matches(&self, name: &str, mentioned: bool) -> bool {
        self.command == name && self.options.mention.allows(mentioned)
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("command", &self.command)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// 命令行首个 token 的解析结果：`/name` 或 `/name@botname`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub mention: Option<&'a str>,
}

/// 解析消息文本中的命令头，不是命令或格式错误时返回 `None`
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let header = text.strip_prefix('/')?.split_whitespace().next().unwrap_or("");

    let mut parts = header.split('@');
    let name = parts.next().unwrap_or("");
    let mention = parts.next();
    if parts.next().is_some() {
        return None;
    }

    Some(ParsedCommand { name, mention })
}

/// 去掉注册时可能带上的 `/`
pub fn normalize_command(command: &str) -> &str {
    command.strip_prefix('/').unwrap_or(command)
}

/// 按注册顺序保存的命令列表，先注册者优先
#[derive(Default, Clone)]
pub struct CommandRouter {
    commands: Vec<RegisteredCommand>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        command: &str,
        handler: CommandHandler,
        options: CommandOptions,
    ) -> Result<()> {
        let command = normalize_command(command);
        if self.contains(command) {
            return Err(XgramError::duplicate_command(command));
        }

        self.commands.push(RegisteredCommand {
            command: command.to_string(),
            options,
            handler,
        });
        Ok(())
    }

    /// 按存储的名称精确比较，调用方负责去掉 `/`
    pub fn contains(&self, command: &str) -> bool {
        self.commands.iter().any(|registered| registered.command == command)
    }

    /// 第一个名称匹配且提及策略兼容的命令
    pub fn find(&self, name: &str, mentioned: bool) -> Option<&RegisteredCommand> {
        self.commands
            .iter()
            .find(|registered| registered.matches(name, mentioned))
    }

    pub fn commands(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
