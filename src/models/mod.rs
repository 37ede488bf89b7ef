pub mod difficulty;
pub mod history;
pub mod library;
pub mod question;
pub mod subject;

pub use difficulty::Difficulty;
pub use history::QuizAttempt;
pub use library::{BookStructure, BookSummary, Chapter, IndexEntry, LibraryIndex, UNCATEGORIZED};
pub use question::{AuditIssue, AuditReport, GenerationOutput, OptionKey, QuizQuestion};
pub use subject::Subject;
