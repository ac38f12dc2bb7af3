use teloxide::RequestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XgramError {
    #[error("Command already registered: {command}")]
    DuplicateCommand { command: String },

    #[error("Callback query key already registered: {key}")]
    DuplicateCallbackKey { key: String },

    #[error("Identifier {identifier} contains unexpected character")]
    MalformedIdentifier { identifier: String },

    #[error("Length must be a positive integer, got {length}")]
    InvalidLength { length: usize },

    #[error("Invalid log file: {path}. Please check path and permissions")]
    InvalidLogFile { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, XgramError>;

impl XgramError {
    pub fn duplicate_command(command: impl Into<String>) -> Self {
        Self::DuplicateCommand {
            command: command.into(),
        }
    }

    pub fn duplicate_callback_key(key: impl Into<String>) -> Self {
        Self::DuplicateCallbackKey { key: key.into() }
    }

    pub fn malformed_identifier(identifier: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.into(),
        }
    }

    pub fn invalid_log_file(path: impl Into<String>) -> Self {
        Self::InvalidLogFile { path: path.into() }
    }

    /// 是否为注册阶段的冲突
    pub fn is_registration_conflict(&self) -> bool {
        matches!(
            self,
            XgramError::DuplicateCommand { .. } | XgramError::DuplicateCallbackKey { .. }
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            XgramError::DuplicateCommand { .. } => ErrorSeverity::Medium,
            XgramError::DuplicateCallbackKey { .. } => ErrorSeverity::Medium,
            XgramError::MalformedIdentifier { .. } => ErrorSeverity::High,
            XgramError::InvalidLength { .. } => ErrorSeverity::Low,
            XgramError::InvalidLogFile { .. } => ErrorSeverity::Critical,
            XgramError::Config(_) => ErrorSeverity::Critical,
            XgramError::Telegram(_) => ErrorSeverity::Medium,
            XgramError::Io(_) => ErrorSeverity::Medium,
            XgramError::Env(_) => ErrorSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
