use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram API error {code}: {description}")]
    Telegram {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to download image #{index}: {message}")]
    Download { index: usize, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Telegram,
    Storage,
    Configuration,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::Http(_) | BotError::Download { .. } => ErrorCategory::Network,
            BotError::Telegram { .. } => ErrorCategory::Telegram,
            BotError::Zip(_) | BotError::Io(_) => ErrorCategory::Storage,
            BotError::Toml(_)
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigError { .. } => ErrorCategory::Configuration,
            BotError::Serialization(_) | BotError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 429 與 5xx 屬於暫時性錯誤
            BotError::Telegram {
                code, retry_after, ..
            } => {
                if retry_after.is_some() || *code == 429 || *code >= 500 {
                    ErrorSeverity::Medium
                } else if *code == 401 || *code == 404 {
                    ErrorSeverity::Critical
                } else {
                    ErrorSeverity::High
                }
            }
            BotError::Http(_) | BotError::Download { .. } => ErrorSeverity::Medium,
            BotError::Zip(_) | BotError::Serialization(_) | BotError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            BotError::Io(_) => ErrorSeverity::High,
            BotError::Toml(_)
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Seconds Telegram asked us to wait before the next call, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            BotError::Telegram { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Message shown to chat users and on stderr. Never contains request URLs.
    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::Telegram { description, .. } => format!("Telegram 拒绝了请求：{}", description),
            BotError::Http(_) => "网络请求失败，请稍后再试".to_string(),
            BotError::Download { index, .. } => format!("第 {} 张图片下载失败", index),
            BotError::Zip(_) => "压缩包生成失败".to_string(),
            BotError::Io(_) => "读写临时文件失败".to_string(),
            BotError::Serialization(_) => "无法解析 Telegram 的响应".to_string(),
            BotError::Toml(e) => format!("配置文件格式错误：{}", e),
            BotError::MissingConfigError { field } => format!("缺少必需的配置项 {}", field),
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("配置项 {} 无效：{}", field, reason)
            }
            BotError::ConfigError { message } => format!("配置错误：{}", message),
            BotError::ProcessingError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "检查网络连接后重新开始收集",
            ErrorCategory::Telegram => match self.severity() {
                ErrorSeverity::Critical => "确认 TG_BOT_TOKEN 是否正确",
                ErrorSeverity::Medium => "请求过于频繁，稍等片刻再试",
                _ => "检查发送的消息是否仍然可用",
            },
            ErrorCategory::Storage => "确认工作目录可写并且磁盘空间充足",
            ErrorCategory::Configuration => "检查命令行参数、环境变量和配置文件",
            ErrorCategory::Processing => "重新开始一次收集",
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
