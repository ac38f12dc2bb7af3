use async_trait::async_trait;
use teloxide::{
    types::{ChatId, MessageId},
    RequestError,
};

use crate::bot::button::Button;
use crate::bot::types::BotProfile;

/// 抽象Bot API操作的trait，BotClient 只依赖这些能力，测试时可以mock
#[async_trait]
pub trait BotTransport: Send + Sync {
    /// 获取机器人自身信息
    async fn get_me(&self) -> Result<BotProfile, RequestError>;

    /// 发送消息
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageId, RequestError>;

    /// 发送带内联键盘的消息，每个内层 Vec 是一行按钮
    async fn send_message_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: Vec<Vec<Button>>,
    ) -> Result<MessageId, RequestError>;

    /// 应答回调查询，让客户端停止加载动画
    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), RequestError>;
}
