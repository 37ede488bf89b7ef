use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio_test::{assert_err, assert_ok};
use upsc_exam_engine::clients::{PageExtractor, TextGenerator};
use upsc_exam_engine::error::{AppError, ConfigError, LlmError, PdfError};
use upsc_exam_engine::models::{Difficulty, OptionKey};
use upsc_exam_engine::services::HistoryStore;
use upsc_exam_engine::workflow::AppState;
use upsc_exam_engine::Config;

/// 结构推断与出题都返回固定内容，并记录结构推断次数
#[derive(Default)]
struct FakeModel {
    structure_calls: AtomicUsize,
    question_calls: AtomicUsize,
}

impl TextGenerator for FakeModel {
    async fn generate_text(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        if prompt.contains("table of contents") {
            self.structure_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(r#"```json
{"subject": "Environment", "chapters": [
  {"index": 1, "title": "Biodiversity", "topics": ["Hotspots"], "page_start": 5, "page_end": 18},
  {"index": 2, "title": "Climate Change", "page_start": 19, "page_end": 0}
]}
```"#
                .to_string());
        }
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"questions": [
  {"question_text": "Consider the following statements: 1. Alpha. 2. Beta. Which of the statements given above is/are correct?",
   "options": {"A": "1 only", "B": "2 only", "C": "Both 1 and 2", "D": "Neither 1 nor 2"},
   "correct_option": "C", "explanation": "Both hold."}
]}"#
            .to_string())
    }
}

#[derive(Default)]
struct RecordingExtractor {
    ranges: Mutex<Vec<(u32, Option<u32>)>>,
}

impl PageExtractor for RecordingExtractor {
    fn extract_pages(&self, _path: &Path, start: u32, end: Option<u32>) -> Result<String, PdfError> {
        self.ranges.lock().unwrap().push((start, end));
        Ok(format!("pages {}..{:?}", start, end))
    }
}

fn config(dir: &Path) -> Config {
    Config {
        library_dir: dir.join("library"),
        index_file: dir.join("library_index.json"),
        history_file: dir.join("quiz_history.json"),
        ..Config::default()
    }
}

fn structure_calls(state: &AppState<FakeModel, RecordingExtractor>) -> usize {
    state.engine().generator().structure_calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn test_library_scan_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let state = AppState::new(config(tmp.path()), FakeModel::default(), RecordingExtractor::default());

    // 首次扫描只创建目录
    let logs = state.scan_library().await;
    assert_eq!(logs.len(), 1);
    assert!(state.librarian().load_index().await.files.is_empty());

    let upload = tmp.path().join("sample.pdf");
    std::fs::write(&upload, b"%PDF-1.4 first edition").unwrap();
    let logs = state.add_to_library(&[upload]).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(structure_calls(&state), 0);

    let pdf = tmp.path().join("library").join("sample.pdf");
    state.scan_library().await;
    assert_eq!(structure_calls(&state), 1);
    assert_eq!(state.librarian().extractor().ranges.lock().unwrap()[0], (1, Some(15)));

    let logs = state.scan_library().await;
    assert!(logs.is_empty());
    assert_eq!(structure_calls(&state), 1);

    std::fs::write(&pdf, b"%PDF-1.4 second edition").unwrap();
    state.scan_library().await;
    assert_eq!(structure_calls(&state), 2);

    let grouped = state.librarian().structure().await;
    let books = &grouped["Environment"];
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].chapters[0].topics, vec!["Hotspots".to_string()]);

    // 索引文件格式
    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(tmp.path().join("library_index.json")).unwrap()).unwrap();
    assert_eq!(raw["files"]["sample.pdf"]["chapters"][1]["page_end"], 0);
    assert_eq!(raw["files"]["sample.pdf"]["hash"].as_str().unwrap().len(), 64);

    let content = state.librarian().chapter_content("sample.pdf", 2).await.unwrap();
    assert_eq!(content, "pages 19..None");

    std::fs::remove_file(&pdf).unwrap();
    let logs = state.scan_library().await;
    assert_eq!(logs.len(), 1);
    assert!(state.librarian().load_index().await.files.is_empty());
}

#[tokio::test]
async fn test_chapter_quiz_to_history() {
    let tmp = tempfile::tempdir().unwrap();
    let mut state = AppState::new(config(tmp.path()), FakeModel::default(), RecordingExtractor::default());
    std::fs::create_dir_all(tmp.path().join("library")).unwrap();
    std::fs::write(tmp.path().join("library").join("shankar.pdf"), b"%PDF").unwrap();
    state.scan_library().await;

    assert_ok!(state.start_chapter_quiz("shankar.pdf", 1, Difficulty::Extreme, 1).await);
    assert_ok!(state.answer(1, Some(OptionKey::C)));
    let score = state.submit().await.unwrap();
    assert_eq!(score.score, 2.0);
    assert_eq!(score.max_score, 2.0);
    assert_eq!(state.engine().generator().question_calls.load(Ordering::SeqCst), 1);

    // 另开一个 store 读取同一文件
    let history = HistoryStore::new(tmp.path().join("quiz_history.json")).load().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].topic, "Biodiversity");
    assert_eq!(history[0].questions[0].correct_option, OptionKey::C);

    let report = tmp.path().join("result.pdf");
    assert_ok!(state.export_report(&report).await);
    assert!(std::fs::metadata(&report).unwrap().len() > 0);
}

#[tokio::test]
async fn test_missing_api_key_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let Err(err) = AppState::from_config(config(tmp.path())) else {
        panic!("缺少 API Key 时不应创建客户端");
    };
    assert!(matches!(err, AppError::Config(ConfigError::MissingApiKey)));
    assert_err!(config(tmp.path()).require_api_key());
}

#[tokio::test]
#[ignore] // 需要真实的 GEMINI_API_KEY：cargo test -- --ignored
async fn test_live_topic_practice() {
    let _ = dotenvy::dotenv();
    upsc_exam_engine::logger::init(true);

    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        history_file: tmp.path().join("quiz_history.json"),
        ..Config::from_env()
    };
    let mut state = AppState::from_config(config).expect("需要 GEMINI_API_KEY");

    let session = state
        .start_topic_practice("Indian Monsoon", Difficulty::Moderate, 2, None)
        .await
        .expect("生成题目失败");
    assert!(!session.questions.is_empty());

    let audit = state.audit_current().await.expect("审核失败");
    println!("审核结论: {} ({})", audit.verdict, audit.overall_score);
}
