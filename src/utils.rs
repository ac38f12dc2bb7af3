use chrono::{DateTime, TimeZone};
use rand::{distributions::Alphanumeric, Rng};
use crate::error::{Result, XgramError};

/// 回调标识符与唯一键的默认长度
pub const DEFAULT_KEY_LENGTH: usize = 10;

/// 生成由 `[A-Za-z0-9]` 组成的随机字符串
pub fn generate_random_string(length: usize) -> Result<String> {
    if length < 1 {
        return Err(XgramError::InvalidLength { length });
    }

    Ok(rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}

/// 格式化工具
pub struct Formatter;

impl Formatter {
    /// 日志行前缀中的时间部分，例如 `19.10.2026 08:05:03 (042ms)`
    pub fn format_log_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        timestamp.format("%d.%m.%Y %H:%M:%S (%3fms)").to_string()
    }

    /// 显示用的机器人名称
    pub fn format_username(username: &str) -> String {
        format!("@{}", username.trim_start_matches('@'))
    }
}

/// 验证工具
pub struct Validator;

impl Validator {
    /// 命令名只允许字母、数字和下划线
    pub fn is_valid_command_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 32
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Telegram 限制 callback_data 最多 64 字节
    pub fn is_valid_callback_data(data: &str) -> bool {
        !data.is_empty() && data.len() <= 64
    }
}
