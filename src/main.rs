use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use log::{error, info};

use xgram::bot::dispatcher::start_bot;
use xgram::{
    BotClient, CallbackOptions, CommandOptions, FileLogger, MentionPolicy, Settings,
    TeloxideTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv().ok();

    // 初始化日志
    env_logger::init();

    info!("🚀 Starting xgram: Initializing application");

    // 加载配置
    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            error!("❌ Configuration failed: {e}");
            return Err(e);
        }
    };

    // 验证配置
    if let Err(e) = settings.validate() {
        error!("❌ Configuration validation failed: {e}");
        return Err(e);
    }

    let options = settings.bot_options();
    let bot = teloxide::Bot::new(&options.token);
    let client = BotClient::with_scheme(
        Arc::new(TeloxideTransport::new(bot.clone())),
        settings.callback_id_scheme,
    );

    if let Some(path) = &settings.log_file {
        client.set_logger(Arc::new(FileLogger::new(path)?));
        info!("📝 Writing dispatch log to {path}");
    }

    register_handlers(&client)?;

    info!("🤖 xgram initialized successfully!");
    info!("📊 Configuration:");
    info!("  - Polling: {}", options.polling);
    info!("  - Log level: {}", settings.log_level);
    info!("  - Callback id scheme: {:?}", settings.callback_id_scheme);
    info!("  - Commands: {}", client.command_count());

    if !options.polling {
        info!("🔧 Polling disabled, exiting after initialization.");
        return Ok(());
    }

    start_bot(client, bot).await
}

fn register_handlers(client: &BotClient) -> Result<()> {
    client.command(
        "start",
        |client, message| async move {
            client
                .send_message(message.chat_id, "Hello! Send /help to see what I can do.")
                .await?;
            Ok(())
        },
        CommandOptions::default(),
    )?;

    client.command(
        "help",
        |client, message| async move {
            let help_text = "Supported commands:\n/start - greeting\n/help - this text\n/echo <text> - repeat text\n/menu - inline buttons\n/ping@<bot> - only answers when mentioned";
            client.send_message(message.chat_id, help_text).await?;
            Ok(())
        },
        CommandOptions::default(),
    )?;

    client.command(
        "echo",
        |client, message| async move {
            let reply = message.command_args().unwrap_or("Nothing to echo").to_string();
            client.send_message(message.chat_id, &reply).await?;
            Ok(())
        },
        CommandOptions::default(),
    )?;

    client.command(
        "ping",
        |client, message| async move {
            client.send_message(message.chat_id, "pong").await?;
            Ok(())
        },
        CommandOptions::with_mention(MentionPolicy::OnlyWith),
    )?;

    let like = client
        .button()
        .set_label("👍")
        .set_handler(|client, event| async move {
            if let Some(chat_id) = event.chat_id {
                client.send_message(chat_id, "Thanks!").await?;
            }
            client.answer_callback_query(&event.id).await?;
            Ok(())
        })?
        .build();

    let dislike = client
        .button()
        .set_label("👎")
        .set_handler(|client, event| async move {
            client.answer_callback_query(&event.id).await?;
            Ok(())
        })?
        .build();

    let about_query = client.callback_query(
        "about",
        |client, event| async move {
            if let Some(chat_id) = event.chat_id {
                client
                    .send_message(chat_id, "xgram: commands and inline buttons on top of teloxide")
                    .await?;
            }
            client.answer_callback_query(&event.id).await?;
            Ok(())
        },
        CallbackOptions::default(),
    )?;
    let about = xgram::Button {
        label: "About".to_string(),
        callback_data: about_query,
    };

    let menu = vec![vec![like, dislike], vec![about]];
    client.command(
        "menu",
        move |client, message| {
            let menu = menu.clone();
            async move {
                client
                    .send_message_with_buttons(message.chat_id, "Choose an option:", menu)
                    .await?;
                Ok(())
            }
        },
        CommandOptions::default(),
    )?;

    Ok(())
}
