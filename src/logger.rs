use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, XgramError};
use crate::utils::Formatter;

pub const DEFAULT_LOG_FILE: &str = "./latest.log";

/// 可替换的日志接口，BotClient 通过它输出调度相关的日志
pub trait BotLogger: Send + Sync {
    fn debug(&self, message: &str);
    fn log(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Info => "[INFO]",
            LogLevel::Warning => "[WARN]",
            LogLevel::Error => "[ERROR]",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[30m",
            LogLevel::Info => "\x1b[37m",
            LogLevel::Warning => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }
}

/// 默认实现：转发到 `log` 门面
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl BotLogger for LogFacade {
    fn debug(&self, message: &str) {
        log::debug!("{message}");
    }

    fn log(&self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// 写入文件的日志器，每次启动时清空文件
#[derive(Debug)]
pub struct FileLogger {
    path: PathBuf,
    file: Mutex<File>,
    echo: bool,
}

impl FileLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open(&path)
            .map_err(|_| XgramError::invalid_log_file(path.display().to_string()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            echo: true,
        })
    }

    /// 写入当前目录下的 `latest.log`
    pub fn with_default_path() -> Result<Self> {
        Self::new(DEFAULT_LOG_FILE)
    }

    /// 关闭控制台输出，只写文件
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> std::io::Result<File> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        OpenOptions::new().create(true).append(true).open(path)?;

        if !fs::metadata(path)?.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }

        OpenOptions::new().write(true).truncate(true).open(path)
    }

    pub fn format_line(level: LogLevel, message: &str) -> String {
        format!(
            "[{}] {} {}",
            Formatter::format_log_timestamp(&Local::now()),
            level.label(),
            message
        )
    }

    fn write(&self, level: LogLevel, message: &str) {
        let line = Self::format_line(level, message);

        if self.echo {
            let colored = format!("{}{}\x1b[0m", level.color(), line);
            match level {
                LogLevel::Debug | LogLevel::Info => println!("{colored}"),
                LogLevel::Warning | LogLevel::Error => eprintln!("{colored}"),
            }
        }

        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}").and_then(|_| file.flush()) {
            eprintln!("Failed to log to {}: {e}", self.path.display());
        }
    }
}

impl BotLogger for FileLogger {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    fn log(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}
