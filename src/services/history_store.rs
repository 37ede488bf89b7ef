//! 测验历史服务 - 业务能力层
//!
//! 只负责"保存与读取已提交的测验"，记录一经写入不再修改。

use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::error::FileError;
use crate::models::{QuizAttempt, QuizQuestion};
use crate::utils::{read_json_or_default, write_json_atomic};

/// 时间戳格式（本地时间）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 测验历史服务
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 保存一次测验，返回新记录的 id
    ///
    /// 新记录插在最前面，整个文件原子重写。
    pub async fn save(
        &self,
        topic: &str,
        questions: &[QuizQuestion],
        score: f64,
        max_score: f64,
    ) -> Result<String, FileError> {
        let attempt = QuizAttempt {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            topic: topic.to_string(),
            score,
            max_score,
            questions: questions.to_vec(),
        };
        let id = attempt.id.clone();

        let mut history = self.load().await;
        history.insert(0, attempt);
        write_json_atomic(&self.path, &history).await?;

        info!("💾 已保存测验记录 {} ({})", id, topic);
        Ok(id)
    }

    /// 全部记录，最新的在前；文件缺失或损坏时为空
    pub async fn load(&self) -> Vec<QuizAttempt> {
        read_json_or_default(&self.path).await
    }

    pub async fn get(&self, id: &str) -> Option<QuizAttempt> {
        self.load().await.into_iter().find(|attempt| attempt.id == id)
    }
}
