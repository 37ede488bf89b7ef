pub mod gemini;
pub mod pdf_reader;

pub use gemini::{GeminiClient, TextGenerator};
pub use pdf_reader::{LopdfExtractor, PageExtractor};
