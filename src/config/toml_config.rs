use crate::utils::error::{BotError, Result};
use crate::utils::logger::LogFormat;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// Optional configuration file. Every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub telegram: TelegramSection,
    pub download: DownloadSection,
    pub storage: StorageSection,
    pub logging: LoggingSection,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub poll_timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSection")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("poll_timeout_seconds", &self.poll_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSection {
    pub concurrent_downloads: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub work_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub format: Option<LogFormat>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| BotError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }
}

/// 替換環境變數 (例如 ${TG_BOT_TOKEN})，未設定的保持原樣
fn substitute_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
