use std::env;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::bot::{BotOptions, QueryIdScheme};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub telegram_bot_token: String,
    pub polling: bool,
    pub log_file: Option<String>,
    pub callback_id_scheme: QueryIdScheme,
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        let polling = env::var("BOT_POLLING")
            .ok()
            .map(|value| !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        let log_file = env::var("LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty());

        let callback_id_scheme = match env::var("CALLBACK_ID_SCHEME") {
            Ok(value) => value
                .parse::<QueryIdScheme>()
                .map_err(|e| anyhow!("{}", e))?,
            Err(_) => QueryIdScheme::default(),
        };

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Settings {
            telegram_bot_token,
            polling,
            log_file,
            callback_id_scheme,
            log_level,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(anyhow!("Telegram bot token cannot be empty"));
        }

        Ok(())
    }

    pub fn bot_options(&self) -> BotOptions {
        BotOptions {
            token: self.telegram_bot_token.clone(),
            polling: self.polling,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            telegram_bot_token: String::new(),
            polling: true,
            log_file: None,
            callback_id_scheme: QueryIdScheme::default(),
            log_level: "info".to_string(),
        }
    }
}
