use anyhow::Result;
use log::{debug, error, info};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
    RequestError,
};

use crate::bot::client::BotClient;
use crate::bot::types::{CallbackEvent, IncomingMessage};

/// 把 teloxide 的 message / callback_query 更新转发给 BotClient
pub struct BotDispatcher {
    client: BotClient,
}

impl BotDispatcher {
    pub fn new(client: BotClient) -> Self {
        Self { client }
    }

    pub async fn run(self, bot: Bot) -> Result<()> {
        info!("🤖 Starting xgram dispatcher...");

        let message_client = self.client.clone();
        let callback_client = self.client.clone();

        Dispatcher::builder(
            bot,
            dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let client = message_client.clone();
                    async move {
                        debug!(
                            "Handling message from chat: {}, user: {:?}",
                            msg.chat.id,
                            msg.from().and_then(|user| user.username.as_deref())
                        );

                        client.handle_message(IncomingMessage::from(&msg)).await;
                        Ok::<(), RequestError>(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |query: CallbackQuery| {
                        let client = callback_client.clone();
                        async move {
                            debug!(
                                "Handling callback query {} with data {:?}",
                                query.id, query.data
                            );

                            client.handle_callback_query(CallbackEvent::from(&query)).await;
                            Ok::<(), RequestError>(())
                        }
                    },
                )),
        )
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

        Ok(())
    }
}

/// 启动机器人的主函数
pub async fn start_bot(client: BotClient, bot: Bot) -> Result<()> {
    info!("🚀 Initializing Telegram Bot...");

    // 获取机器人信息
    match bot.get_me().await {
        Ok(me) => {
            info!("✅ Bot connected successfully:");
            info!("  - Username: @{}", me.username());
            info!("  - Name: {}", me.first_name);
            info!("  - ID: {}", me.id);
        }
        Err(e) => {
            error!("❌ Failed to connect to Telegram Bot API: {e}");
            return Err(anyhow::anyhow!("Bot connection failed: {}", e));
        }
    }

    info!(
        "📋 Registered {} commands and {} callback queries",
        client.command_count(),
        client.callback_count()
    );

    let dispatcher = BotDispatcher::new(client);
    dispatcher.run(bot).await?;

    Ok(())
}
