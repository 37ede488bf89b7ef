pub mod app_state;

pub use app_state::{AppState, QuizSession, MOCK_TEST_TOPIC};
