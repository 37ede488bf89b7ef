//! 出题引擎 - 业务能力层
//!
//! 只负责"调用模型并得到结构化结果"能力：
//! - 按模板拼接提示词
//! - 限流时指数退避重试
//! - 清洗并严格解析模型返回的 JSON
//!
//! 引擎在进程启动时创建一次，之后按引用共享。

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clients::TextGenerator;
use crate::config::Config;
use crate::error::LlmError;
use crate::models::{AuditReport, BookStructure, Difficulty, GenerationOutput, QuizQuestion, Subject};
use crate::services::prompts;
use crate::utils::{parse_model_json, retry_on_rate_limit, RetryPolicy};

/// 一次出题请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub num_questions: usize,
    /// 作为上下文的资料原文（章节内容或上传的 PDF）
    pub source_text: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, num_questions: usize) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            num_questions,
            source_text: None,
        }
    }

    pub fn with_source(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }
}

/// 多科目批量出题的结果
#[derive(Debug, Clone, Default)]
pub struct BalancedSet {
    pub questions: Vec<QuizQuestion>,
    /// 未中断批次的单科错误，格式为 `科目: 错误`
    pub errors: Vec<String>,
}

/// 把 `total` 道题分配给 `n` 个科目，余数分给前面的科目
pub fn partition(total: usize, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let base = total / n;
    let remainder = total % n;
    (0..n).map(|i| base + usize::from(i < remainder)).collect()
}

/// 出题引擎
pub struct ExamEngine<G> {
    generator: G,
    model_name: String,
    fallback_models: Vec<String>,
    retry: RetryPolicy,
    subject_delay: Duration,
}

impl<G: TextGenerator> ExamEngine<G> {
    /// 创建新的出题引擎
    pub fn new(generator: G, config: &Config) -> Self {
        Self {
            generator,
            model_name: config.model_name.clone(),
            fallback_models: config.fallback_models.clone(),
            retry: RetryPolicy::from_config(config),
            subject_delay: Duration::from_secs(config.subject_delay_secs),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_subject_delay(mut self, delay: Duration) -> Self {
        self.subject_delay = delay;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 带重试地调用模型并解析为 JSON
    async fn call_json<T: DeserializeOwned>(&self, model: &str, prompt: &str) -> Result<T, LlmError> {
        let text = retry_on_rate_limit(&self.retry, || self.generator.generate_text(model, prompt)).await?;
        parse_model_json(&text)
    }

    /// 通用出题调用
    ///
    /// 返回解析后的 JSON；模型按约定返回 `{"error": ...}` 时转为 [`LlmError::ModelReported`]。
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Value, LlmError> {
        debug!(
            "出题: 主题={}, 难度={}, 数量={}, 含资料={}",
            request.topic,
            request.difficulty,
            request.num_questions,
            request.source_text.is_some()
        );

        let prompt = prompts::question_prompt(
            &request.topic,
            request.difficulty,
            request.num_questions,
            request.source_text.as_deref(),
        );
        let value: Value = self.call_json(&self.model_name, &prompt).await?;

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(LlmError::ModelReported(error.to_string()));
        }
        Ok(value)
    }

    /// 出题并严格解析为题目列表
    pub async fn generate_questions(&self, request: &GenerationRequest) -> Result<Vec<QuizQuestion>, LlmError> {
        let value = self.generate(request).await?;
        let raw = value.to_string();
        let output: GenerationOutput =
            serde_json::from_value(value).map_err(|source| LlmError::MalformedOutput { raw, source })?;
        output.into_questions()
    }

    /// 在多个科目之间均衡出题
    ///
    /// 逐科目顺序调用，两次调用之间固定等待 `subject_delay`。
    /// 任一科目重试耗尽（服务繁忙）时立即中止并返回该错误；
    /// 其他单科错误记入 `errors` 后继续。
    pub async fn generate_balanced_set(
        &self,
        total: usize,
        topics: &[String],
        difficulty: Difficulty,
    ) -> Result<BalancedSet, LlmError> {
        let counts = partition(total, topics.len());
        let mut set = BalancedSet::default();
        let mut first_call = true;

        for (topic, count) in topics.iter().zip(counts) {
            if count == 0 {
                continue;
            }
            if !first_call {
                tokio::time::sleep(self.subject_delay).await;
            }
            first_call = false;

            info!("📝 正在为 {} 生成 {} 道题...", topic, count);
            let request = GenerationRequest::new(topic.clone(), difficulty, count);
            match self.generate_questions(&request).await {
                Ok(questions) => {
                    info!("✓ {} 完成，得到 {} 道题", topic, questions.len());
                    set.questions.extend(questions);
                }
                Err(e) if e.is_service_busy() => {
                    warn!("⛔ {} 生成时服务繁忙，中止整套试卷", topic);
                    return Err(e);
                }
                Err(e) => {
                    warn!("❌ {} 生成失败: {}", topic, e);
                    set.errors.push(format!("{}: {}", topic, e));
                }
            }
        }

        if set.questions.is_empty() {
            return Err(LlmError::EmptyBatch { details: set.errors });
        }
        Ok(set)
    }

    /// 覆盖全部八个科目的模拟考试
    pub async fn generate_mock_test(&self, total: usize, difficulty: Difficulty) -> Result<BalancedSet, LlmError> {
        let topics: Vec<String> = Subject::MOCK_TEST.iter().map(|s| s.topic()).collect();
        self.generate_balanced_set(total, &topics, difficulty).await
    }

    /// 根据目录文本推断书籍的学科与章节
    ///
    /// 先用主模型，失败后依次尝试备用模型，返回第一个成功结果或最后一个错误。
    pub async fn analyze_structure(&self, toc_text: &str, filename: &str) -> Result<BookStructure, LlmError> {
        let prompt = prompts::structure_prompt(toc_text, filename);

        let mut models = vec![self.model_name.as_str()];
        for model in &self.fallback_models {
            if !models.contains(&model.as_str()) {
                models.push(model);
            }
        }

        let mut last_error = None;
        for model in models {
            match self.call_json::<Value>(model, &prompt).await {
                Ok(value) => {
                    if let Some(error) = value.get("error").and_then(Value::as_str) {
                        warn!("模型 {} 无法分析 {}: {}", model, filename, error);
                        last_error = Some(LlmError::ModelReported(error.to_string()));
                        continue;
                    }
                    let raw = value.to_string();
                    match serde_json::from_value::<BookStructure>(value) {
                        Ok(structure) => match structure.validate() {
                            Ok(()) => return Ok(structure),
                            Err(reason) => {
                                warn!("模型 {} 返回的结构无效: {}", model, reason);
                                last_error = Some(LlmError::InvalidStructure {
                                    model: model.to_string(),
                                    reason,
                                });
                            }
                        },
                        Err(source) => {
                            warn!("模型 {} 返回的结构无法解析: {}", model, source);
                            last_error = Some(LlmError::MalformedOutput { raw, source });
                        }
                    }
                }
                Err(e) => {
                    warn!("模型 {} 分析 {} 失败: {}", model, filename, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent {
            model: self.model_name.clone(),
        }))
    }

    /// 以资深审题人的角度审核一套题目
    pub async fn evaluate_questions(&self, questions: &[QuizQuestion], topic: &str) -> Result<AuditReport, LlmError> {
        let prompt = prompts::audit_prompt(questions, topic);
        let value: Value = self.call_json(&self.model_name, &prompt).await?;

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(LlmError::ModelReported(error.to_string()));
        }
        let raw = value.to_string();
        serde_json::from_value(value).map_err(|source| LlmError::MalformedOutput { raw, source })
    }
}
