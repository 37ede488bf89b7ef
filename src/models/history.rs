use crate::models::QuizQuestion;
use serde::{Deserialize, Serialize};

/// 一次已提交的测验记录，保存后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    /// 本地时间，格式 `YYYY-MM-DD HH:MM`
    pub timestamp: String,
    pub topic: String,
    pub score: f64,
    pub max_score: f64,
    pub questions: Vec<QuizQuestion>,
}
