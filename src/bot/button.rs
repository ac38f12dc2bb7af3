use serde::{Deserialize, Serialize};
use std::future::Future;
use teloxide::types::InlineKeyboardButton;

use crate::bot::client::BotClient;
use crate::bot::types::CallbackEvent;
use crate::bot::HandlerResult;
use crate::error::Result;
use crate::utils::Validator;

/// 内联按钮描述：显示文本 + 回调数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl From<Button> for InlineKeyboardButton {
    fn from(button: Button) -> Self {
        InlineKeyboardButton::callback(button.label, button.callback_data)
    }
}

pub struct ButtonBuilder {
    client: BotClient,
    label: String,
    callback_data: String,
}

impl ButtonBuilder {
    pub fn new(client: BotClient) -> Self {
        Self {
            client,
            label: String::new(),
            callback_data: String::new(),
        }
    }

    pub fn set_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// 用随机键注册处理器，并把分配到的标识符作为按钮的回调数据
    pub fn set_handler<F, Fut>(mut self, handler: F) -> Result<Self>
    where
        F: Fn(BotClient, CallbackEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = self.client.unique_key()?;
        self.callback_data = self
            .client
            .callback_query(&key, handler, Default::default())?;
        Ok(self)
    }

    /// 未调用 `set_handler` 时回调数据为空，由调用方负责
    pub fn build(self) -> Button {
        if !Validator::is_valid_callback_data(&self.callback_data) {
            self.client
                .logger()
                .debug(&format!("Button \"{}\" built without a callback handler", self.label));
        }

        Button {
            label: self.label,
            callback_data: self.callback_data,
        }
    }
}
