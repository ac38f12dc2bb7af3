// 公开内部模块以便测试
pub mod bot;
pub mod config;
pub mod error;
pub mod logger;
pub mod utils;

// 重新导出常用的类型和结构体
pub use bot::{
    BotClient, BotOptions, BotTransport, Button, ButtonBuilder, CallbackEvent, CallbackOptions,
    CommandOptions, IncomingMessage, MentionPolicy, QueryIdScheme, TeloxideTransport,
};
pub use config::Settings;
pub use error::XgramError;
pub use logger::{BotLogger, FileLogger, LogFacade};
