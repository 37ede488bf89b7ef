//! 应用状态 - 流程层
//!
//! 核心职责：持有全部长生命周期对象与当前测验会话，
//! 对外暴露界面可直接调用的处理函数。
//!
//! 会话只在 `start_*` / `replay` 中创建，在 `reset_quiz` 中清除，
//! 其他处理函数不会隐式重建会话。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{GeminiClient, LopdfExtractor, PageExtractor, TextGenerator};
use crate::config::Config;
use crate::error::{AppResult, BusinessError, FileError};
use crate::models::{AuditReport, Difficulty, OptionKey, QuizQuestion};
use crate::services::{
    render_results_pdf, score_quiz, ExamEngine, GenerationRequest, HistoryStore, Librarian,
    ReportInput, ScoreCard,
};
use crate::utils::logging::{log_quiz_result, log_scan_summary};

/// 模拟考试在历史记录中的主题名
pub const MOCK_TEST_TOPIC: &str = "UPSC Prelims Mock Test";

/// 进行中的测验
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub topic: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    /// 与 `questions` 一一对应
    pub answers: Vec<Option<OptionKey>>,
    pub submitted: bool,
    pub score: Option<ScoreCard>,
}

impl QuizSession {
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            topic: topic.into(),
            difficulty,
            questions,
            answers,
            submitted: false,
            score: None,
        }
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }
}

/// 应用状态
pub struct AppState<G, E> {
    config: Config,
    engine: Arc<ExamEngine<G>>,
    librarian: Librarian<G, E>,
    history: HistoryStore,
    session: Option<QuizSession>,
}

impl AppState<GeminiClient, LopdfExtractor> {
    /// 使用真实的 Gemini 客户端与 lopdf 提取器
    ///
    /// 未配置 API Key 时在这里失败，不会发出任何请求。
    pub fn from_config(config: Config) -> AppResult<Self> {
        let client = GeminiClient::new(&config)?;
        Ok(Self::new(config, client, LopdfExtractor))
    }
}

impl<G: TextGenerator, E: PageExtractor> AppState<G, E> {
    pub fn new(config: Config, generator: G, extractor: E) -> Self {
        let engine = Arc::new(ExamEngine::new(generator, &config));
        let librarian = Librarian::new(Arc::clone(&engine), extractor, &config);
        let history = HistoryStore::new(config.history_file.clone());
        Self {
            config,
            engine,
            librarian,
            history,
            session: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &ExamEngine<G> {
        &self.engine
    }

    pub fn librarian(&self) -> &Librarian<G, E> {
        &self.librarian
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, BusinessError> {
        self.session.as_mut().ok_or(BusinessError::NoActiveQuiz)
    }

    fn begin(&mut self, session: QuizSession) -> &QuizSession {
        info!(
            "📝 新测验: {} ({} 题, 难度 {})",
            session.topic,
            session.questions.len(),
            session.difficulty
        );
        self.session.insert(session)
    }

    /// 按主题练习，可附带资料原文
    pub async fn start_topic_practice(
        &mut self,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
        source_text: Option<String>,
    ) -> AppResult<&QuizSession> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(BusinessError::EmptyTopic.into());
        }

        let mut request = GenerationRequest::new(topic, difficulty, num_questions);
        request.source_text = source_text;
        let questions = self.engine.generate_questions(&request).await?;
        Ok(self.begin(QuizSession::new(topic, difficulty, questions)))
    }

    /// 覆盖八个科目的模拟考试，返回未中断批次的单科错误
    pub async fn start_mock_test(
        &mut self,
        total: usize,
        difficulty: Difficulty,
    ) -> AppResult<(&QuizSession, Vec<String>)> {
        let set = self.engine.generate_mock_test(total, difficulty).await?;
        for error in &set.errors {
            warn!("⚠️ {}", error);
        }
        let session = self.begin(QuizSession::new(MOCK_TEST_TOPIC, difficulty, set.questions));
        Ok((session, set.errors))
    }

    /// 以资料库中某一章为资料出题
    pub async fn start_chapter_quiz(
        &mut self,
        filename: &str,
        chapter_index: u32,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> AppResult<&QuizSession> {
        let unavailable = || BusinessError::ChapterUnavailable {
            filename: filename.to_string(),
            chapter: chapter_index,
        };

        let index = self.librarian.load_index().await;
        let title = index
            .files
            .get(filename)
            .and_then(|entry| entry.chapter(chapter_index))
            .map(|chapter| chapter.title.clone())
            .ok_or_else(unavailable)?;
        let content = self
            .librarian
            .chapter_content(filename, chapter_index)
            .await
            .ok_or_else(unavailable)?;

        let request = GenerationRequest::new(title.clone(), difficulty, num_questions).with_source(content);
        let questions = self.engine.generate_questions(&request).await?;
        Ok(self.begin(QuizSession::new(title, difficulty, questions)))
    }

    /// 作答（题号从 1 开始），`None` 表示清除答案
    pub fn answer(&mut self, number: usize, choice: Option<OptionKey>) -> AppResult<()> {
        let session = self.session_mut()?;
        if session.submitted {
            return Err(BusinessError::QuizAlreadySubmitted.into());
        }
        let max = session.questions.len();
        let slot = number
            .checked_sub(1)
            .and_then(|i| session.answers.get_mut(i))
            .ok_or(BusinessError::QuestionOutOfRange { index: number, max })?;
        *slot = choice;
        Ok(())
    }

    /// 交卷：计分并写入历史
    ///
    /// 重复提交直接返回第一次的成绩，不会重复写入历史。
    pub async fn submit(&mut self) -> AppResult<ScoreCard> {
        let session = self.session.as_mut().ok_or(BusinessError::NoActiveQuiz)?;
        if let Some(score) = session.score.as_ref().filter(|_| session.submitted) {
            return Ok(score.clone());
        }

        let score = score_quiz(&session.questions, &session.answers);
        self.history
            .save(&session.topic, &session.questions, score.score, score.max_score)
            .await?;
        log_quiz_result(&session.topic, score.score, score.max_score);

        session.submitted = true;
        session.score = Some(score.clone());
        Ok(score)
    }

    /// 审核当前测验的题目质量
    pub async fn audit_current(&self) -> AppResult<AuditReport> {
        let session = self.session.as_ref().ok_or(BusinessError::NoActiveQuiz)?;
        Ok(self
            .engine
            .evaluate_questions(&session.questions, &session.topic)
            .await?)
    }

    /// 导出 PDF 成绩单，只能在交卷后进行
    pub async fn export_report(&self, path: &Path) -> AppResult<PathBuf> {
        let session = self.session.as_ref().ok_or(BusinessError::NoActiveQuiz)?;
        let score = session
            .score
            .as_ref()
            .filter(|_| session.submitted)
            .ok_or(BusinessError::QuizNotSubmitted)?;

        let bytes = render_results_pdf(&ReportInput {
            topic: &session.topic,
            difficulty: session.difficulty,
            questions: &session.questions,
            answers: &session.answers,
            score,
        });
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| FileError::write(path.display().to_string(), e))?;

        info!("📄 成绩单已导出: {}", path.display());
        Ok(path.to_path_buf())
    }

    /// 扫描资料库
    pub async fn scan_library(&self) -> Vec<String> {
        let logs = self.librarian.scan().await;
        log_scan_summary(&logs);
        logs
    }

    /// 把 PDF 加入资料库，下一次扫描时索引
    pub async fn add_to_library(&self, paths: &[PathBuf]) -> Vec<String> {
        self.librarian.add_files(paths).await
    }

    /// 用历史记录中的题目重新开始一次测验
    pub async fn replay(&mut self, id: &str) -> AppResult<&QuizSession> {
        let attempt = self
            .history
            .get(id)
            .await
            .ok_or_else(|| BusinessError::AttemptNotFound(id.to_string()))?;
        Ok(self.begin(QuizSession::new(
            attempt.topic,
            self.config.difficulty,
            attempt.questions,
        )))
    }

    /// 放弃当前测验
    pub fn reset_quiz(&mut self) {
        if self.session.take().is_some() {
            info!("🔄 已清除当前测验");
        }
    }
}
