use teloxide::types::{CallbackQuery, ChatId, Me, Message, MessageId, UserId};

/// 传入的文本消息，从 teloxide 的 `Message` 中提取调度所需的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    pub from_username: Option<String>,
}

impl IncomingMessage {
    pub fn new(chat_id: ChatId, message_id: MessageId, text: Option<&str>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.map(str::to_owned),
            from_username: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// 命令之后的参数部分，例如 `/echo hello world` 返回 `hello world`
    pub fn command_args(&self) -> Option<&str> {
        let text = self.text()?.trim_start();
        let (_, rest) = text.split_once(char::is_whitespace)?;
        let rest = rest.trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

impl From<&Message> for IncomingMessage {
    fn from(message: &Message) -> Self {
        Self {
            chat_id: message.chat.id,
            message_id: message.id,
            text: message.text().map(str::to_owned),
            from_username: message.from().and_then(|user| user.username.clone()),
        }
    }
}

/// 内联按钮被按下时产生的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub id: String,
    pub chat_id: Option<ChatId>,
    pub message_id: Option<MessageId>,
    pub from_username: Option<String>,
    pub data: Option<String>,
}

impl CallbackEvent {
    pub fn new(id: impl Into<String>, data: Option<&str>) -> Self {
        Self {
            id: id.into(),
            chat_id: None,
            message_id: None,
            from_username: None,
            data: data.map(str::to_owned),
        }
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl From<&CallbackQuery> for CallbackEvent {
    fn from(query: &CallbackQuery) -> Self {
        Self {
            id: query.id.clone(),
            chat_id: query.message.as_ref().map(|message| message.chat.id),
            message_id: query.message.as_ref().map(|message| message.id),
            from_username: query.from.username.clone(),
            data: query.data.clone(),
        }
    }
}

/// 机器人自身的信息，用于判断 `@botname` 是否指向自己
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotProfile {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
}

impl From<&Me> for BotProfile {
    fn from(me: &Me) -> Self {
        Self {
            id: me.id,
            username: me.username().to_string(),
            first_name: me.first_name.clone(),
        }
    }
}
