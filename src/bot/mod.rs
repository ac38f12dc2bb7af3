pub mod button;
pub mod callbacks;
pub mod client;
pub mod commands;
pub mod dispatcher;
pub mod traits;
pub mod transport;
pub mod types;

/// 命令和回调处理器的返回值，错误只会被记录，不会向上传播
pub type HandlerResult = anyhow::Result<()>;

pub use button::{Button, ButtonBuilder};
pub use callbacks::{CallbackOptions, CallbackRegistry, QueryIdScheme};
pub use client::{BotClient, BotOptions};
pub use commands::{CommandOptions, CommandRouter, MentionPolicy};
pub use traits::BotTransport;
pub use transport::TeloxideTransport;
pub use types::{BotProfile, CallbackEvent, IncomingMessage};
