use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 选项字母
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }

    /// 解析用户输入（不区分大小写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Some(OptionKey::A),
            "B" => Some(OptionKey::B),
            "C" => Some(OptionKey::C),
            "D" => Some(OptionKey::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单道选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_text: String,
    pub options: BTreeMap<OptionKey, String>,
    pub correct_option: OptionKey,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    /// 校验题目约束：至少两个选项，正确答案必须是已有选项
    pub fn validate(&self, index: usize) -> Result<(), LlmError> {
        if self.question_text.trim().is_empty() {
            return Err(LlmError::InvalidQuestion {
                index,
                reason: "题干为空".to_string(),
            });
        }
        if self.options.len() < 2 {
            return Err(LlmError::InvalidQuestion {
                index,
                reason: format!("选项数量不足: {}", self.options.len()),
            });
        }
        if !self.options.contains_key(&self.correct_option) {
            return Err(LlmError::InvalidQuestion {
                index,
                reason: format!("正确选项 {} 不在选项中", self.correct_option),
            });
        }
        Ok(())
    }
}

/// 题目生成输出：成功返回题目列表，失败时模型按约定返回 error 字段
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    Questions { questions: Vec<QuizQuestion> },
    Error { error: String },
}

impl GenerationOutput {
    /// 转为结果，并逐题校验
    pub fn into_questions(self) -> Result<Vec<QuizQuestion>, LlmError> {
        match self {
            GenerationOutput::Questions { questions } if questions.is_empty() => Err(LlmError::NoQuestions),
            GenerationOutput::Questions { questions } => {
                for (index, question) in questions.iter().enumerate() {
                    question.validate(index + 1)?;
                }
                Ok(questions)
            }
            GenerationOutput::Error { error } => Err(LlmError::ModelReported(error)),
        }
    }
}

/// 审核报告中的单条问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssue {
    /// 0-based 题目索引
    pub question_index: usize,
    pub issue: String,
}

/// 质量审核报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub overall_score: f64,
    pub verdict: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
}
