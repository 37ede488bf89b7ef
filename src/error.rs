use thiserror::Error;

/// 直接展示给用户的"服务繁忙"提示
pub const SERVICE_BUSY_MESSAGE: &str = "⚠️ 模型服务繁忙（429 请求频率限制）。请在设置中切换其他模型，或等待一两分钟后重试。";

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// PDF 解析错误
    #[error("PDF错误: {0}")]
    Pdf(#[from] PdfError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 触发服务端频率限制（可重试）
    #[error("请求频率限制 (模型: {model})")]
    RateLimited { model: String },

    /// 多次重试后仍被限流
    #[error("{}", SERVICE_BUSY_MESSAGE)]
    ServiceBusy { attempts: u32 },

    /// 网络请求失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: reqwest::Error,
    },

    /// 服务端返回非成功状态码
    #[error("LLM API返回错误响应 (模型: {model}): status={status}, body={body}")]
    BadResponse {
        model: String,
        status: u16,
        body: String,
    },

    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },

    /// 模型输出无法解析为 JSON
    #[error("生成内容解析失败: {source}")]
    MalformedOutput {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// 题目不满足约束（例如正确选项不在选项中）
    #[error("第 {index} 题无效: {reason}")]
    InvalidQuestion { index: usize, reason: String },

    /// 题目列表为空
    #[error("模型返回的题目列表为空")]
    NoQuestions,

    /// 书籍结构不满足约束
    #[error("书籍结构无效 (模型: {model}): {reason}")]
    InvalidStructure { model: String, reason: String },

    /// 模型按约定返回了 {"error": ...}
    #[error("模型返回错误: {0}")]
    ModelReported(String),

    /// 批量生成没有得到任何题目
    #[error("未能生成任何题目。\n详情:\n{}", .details.join("\n"))]
    EmptyBatch { details: Vec<String> },
}

impl LlmError {
    /// 是否为可重试的限流信号
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// 是否为重试耗尽后的繁忙错误
    pub fn is_service_busy(&self) -> bool {
        matches!(self, LlmError::ServiceBusy { .. })
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化失败 ({path}): {source}")]
    SerializeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl FileError {
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        FileError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// PDF 解析错误
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("无法打开PDF ({path}): {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: lopdf::Error,
    },
    #[error("提取文本失败 ({path}, 页 {start}-{end}): {source}")]
    ExtractFailed {
        path: String,
        start: u32,
        end: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未配置 API Key，拒绝发起任何网络请求
    #[error("未配置 API Key：请通过 --api-key 或环境变量 GEMINI_API_KEY 提供")]
    MissingApiKey,
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    #[error("请先指定练习主题")]
    EmptyTopic,
    #[error("当前没有进行中的测验")]
    NoActiveQuiz,
    #[error("测验尚未提交")]
    QuizNotSubmitted,
    #[error("测验已提交，不能再修改答案")]
    QuizAlreadySubmitted,
    #[error("题号 {index} 超出范围 [1, {max}]")]
    QuestionOutOfRange { index: usize, max: usize },
    #[error("在资料库中找不到 {filename} 第 {chapter} 章的内容")]
    ChapterUnavailable { filename: String, chapter: u32 },
    #[error("找不到历史记录: {0}")]
    AttemptNotFound(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
