pub mod exam_engine;
pub mod history_store;
pub mod librarian;
pub mod prompts;
pub mod report;
pub mod scoring;

pub use exam_engine::{partition, BalancedSet, ExamEngine, GenerationRequest};
pub use history_store::HistoryStore;
pub use librarian::{add_to_library, Librarian};
pub use report::{render_results_pdf, ReportInput};
pub use scoring::{score_quiz, Outcome, ScoreCard};
