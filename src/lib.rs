//! # UPSC Exam Engine
//!
//! 基于 Gemini 的 UPSC 预考出题、练习与资料库管理
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有外部资源，只暴露能力
//! - `GeminiClient` - 实现 `TextGenerator`，负责 HTTP 调用与限流识别
//! - `LopdfExtractor` - 实现 `PageExtractor`，按页提取 PDF 文本
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ExamEngine` - 出题、均衡组卷、目录结构推断、题目审核
//! - `Librarian` - 资料库扫描与章节正文提取
//! - `HistoryStore` - 测验历史
//! - `score_quiz` / `render_results_pdf` - 计分与成绩单
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - `AppState` 持有会话，提供界面调用的处理函数
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{GeminiClient, LopdfExtractor, PageExtractor, TextGenerator};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Difficulty, OptionKey, QuizAttempt, QuizQuestion};
pub use services::{ExamEngine, GenerationRequest, HistoryStore, Librarian};
pub use workflow::{AppState, QuizSession};
