pub mod fs;
pub mod json;
pub mod logging;
pub mod retry;
pub mod text;

pub use fs::{read_json_or_default, sha256_file, write_json_atomic};
pub use json::{parse_model_json, strip_code_fences};
pub use logging::truncate_text;
pub use retry::{retry_on_rate_limit, RetryPolicy};
pub use text::format_statements;
