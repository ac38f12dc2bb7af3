use async_trait::async_trait;
use log::debug;
use teloxide::{
    payloads::SendMessageSetters,
    requests::Requester,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId},
    Bot, RequestError,
};

use crate::bot::button::Button;
use crate::bot::traits::BotTransport;
use crate::bot::types::BotProfile;

/// 基于 `teloxide::Bot` 的传输实现
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
}

impl TeloxideTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: &str) -> Self {
        Self::new(Bot::new(token))
    }
}

pub fn inline_keyboard(buttons: Vec<Vec<Button>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .into_iter()
            .map(|row| row.into_iter().map(InlineKeyboardButton::from).collect::<Vec<_>>()),
    )
}

#[async_trait]
impl BotTransport for TeloxideTransport {
    async fn get_me(&self) -> Result<BotProfile, RequestError> {
        let me = self.bot.get_me().await?;
        Ok(BotProfile::from(&me))
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId, RequestError> {
        let message = self.bot.send_message(chat_id, text).await?;
        Ok(message.id)
    }

    async fn send_message_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<Vec<Button>>,
    ) -> Result<MessageId, RequestError> {
        debug!("Sending message with {} button rows to chat {}", buttons.len(), chat_id);

        let message = self
            .bot
            .send_message(chat_id, text)
            .reply_markup(inline_keyboard(buttons))
            .await?;
        Ok(message.id)
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), RequestError> {
        self.bot.answer_callback_query(callback_query_id).await?;
        Ok(())
    }
}
