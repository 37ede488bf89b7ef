use crate::error::{ConfigError, FileError};
use crate::models::Difficulty;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    /// Gemini API Key（未配置时拒绝发起任何请求）
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model_name: String,
    /// 结构分析失败时依次尝试的备用模型
    pub fallback_models: Vec<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,

    // --- 重试配置 ---
    pub max_retries: u32,
    pub retry_base_delay_secs: f64,
    pub retry_max_delay_secs: f64,
    /// 模拟考试中两个科目之间的固定间隔（秒）
    pub subject_delay_secs: u64,

    // --- 资料库与历史 ---
    pub library_dir: PathBuf,
    pub index_file: PathBuf,
    pub history_file: PathBuf,
    /// 用于推断目录结构的前几页
    pub toc_pages: u32,

    // --- 测验 ---
    pub num_questions: usize,
    pub difficulty: Difficulty,

    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model_name: "gemini-2.0-flash".to_string(),
            fallback_models: vec![
                "gemini-flash-latest".to_string(),
                "gemini-2.0-flash-lite".to_string(),
            ],
            request_timeout_secs: 120,
            max_retries: 5,
            retry_base_delay_secs: 5.0,
            retry_max_delay_secs: 60.0,
            subject_delay_secs: 5,
            library_dir: PathBuf::from("library"),
            index_file: PathBuf::from("library_index.json"),
            history_file: PathBuf::from("quiz_history.json"),
            toc_pages: 15,
            num_questions: 5,
            difficulty: Difficulty::Hard,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺省值取自 `Default`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self, FileError> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件加载配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, FileError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FileError::read(path.display().to_string(), e))?;
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn with_env_overrides(self) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: env("GEMINI_API_KEY").or(self.api_key),
            api_base_url: env("GEMINI_API_BASE_URL").unwrap_or(self.api_base_url),
            model_name: env("GEMINI_MODEL_NAME").unwrap_or(self.model_name),
            fallback_models: env("GEMINI_FALLBACK_MODELS")
                .map(|v| v.split(',').map(|m| m.trim().to_string()).filter(|m| !m.is_empty()).collect())
                .unwrap_or(self.fallback_models),
            request_timeout_secs: env("REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            max_retries: env("MAX_RETRIES").and_then(|v| v.parse().ok()).unwrap_or(self.max_retries),
            retry_base_delay_secs: env("RETRY_BASE_DELAY_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.retry_base_delay_secs),
            retry_max_delay_secs: env("RETRY_MAX_DELAY_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.retry_max_delay_secs),
            subject_delay_secs: env("SUBJECT_DELAY_SECS").and_then(|v| v.parse().ok()).unwrap_or(self.subject_delay_secs),
            library_dir: env("LIBRARY_DIR").map(PathBuf::from).unwrap_or(self.library_dir),
            index_file: env("LIBRARY_INDEX_FILE").map(PathBuf::from).unwrap_or(self.index_file),
            history_file: env("QUIZ_HISTORY_FILE").map(PathBuf::from).unwrap_or(self.history_file),
            toc_pages: env("TOC_PAGES").and_then(|v| v.parse().ok()).unwrap_or(self.toc_pages),
            num_questions: env("NUM_QUESTIONS").and_then(|v| v.parse().ok()).unwrap_or(self.num_questions),
            difficulty: env("DIFFICULTY").and_then(|v| Difficulty::from_label(&v)).unwrap_or(self.difficulty),
            verbose_logging: env("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 命令行传入的 API Key 优先于环境变量
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// 取出 API Key；缺失时返回配置错误
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
