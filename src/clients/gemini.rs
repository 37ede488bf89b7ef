/// Gemini API 客户端
///
/// 封装 `generateContent` 调用，要求模型以 `application/json` 输出
use crate::config::Config;
use crate::error::{ConfigError, LlmError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 文本生成能力
///
/// 出题引擎只依赖这个 trait，测试时可替换为假实现。
pub trait TextGenerator: Send + Sync {
    /// 用指定模型生成文本（期望为 JSON）
    fn generate_text(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini 客户端
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// 创建客户端；没有 API Key 时直接失败，不会发起任何请求
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url, model)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        debug!("调用 Gemini API，模型: {}", model);
        debug!("提示词长度: {} 字符", prompt.len());

        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|source| LlmError::RequestFailed {
                model: model.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| LlmError::RequestFailed {
                model: model.to_string(),
                source,
            })?;

        if !status.is_success() {
            let err = classify_failure(model, status, &body);
            warn!("Gemini API 调用失败: {}", err);
            return Err(err);
        }

        debug!("Gemini API 调用成功");
        extract_text(model, &body)
    }
}

/// 区分限流与其他失败
fn classify_failure(model: &str, status: StatusCode, body: &str) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        LlmError::RateLimited {
            model: model.to_string(),
        }
    } else {
        LlmError::BadResponse {
            model: model.to_string(),
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        }
    }
}

/// 拼接第一个候选结果中的所有文本片段
fn extract_text(model: &str, body: &str) -> Result<String, LlmError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|source| LlmError::MalformedOutput {
            raw: body.to_string(),
            source,
        })?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyContent {
            model: model.to_string(),
        });
    }
    Ok(text.trim().to_string())
}
