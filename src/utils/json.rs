//! 模型输出的 JSON 清洗与严格解析

use crate::error::LlmError;
use serde::de::DeserializeOwned;

/// 去掉模型可能包裹的 ```json ... ``` 或 ``` ... ``` 代码块标记
pub fn strip_code_fences(text: &str) -> &str {
    let inner = if let Some(pos) = text.find("```json") {
        let rest = &text[pos + "```json".len()..];
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(pos) = text.find("```") {
        let rest = &text[pos + 3..];
        rest.split("```").next().unwrap_or(rest)
    } else {
        text
    };
    inner.trim()
}

/// 清洗后解析为目标类型，失败时保留原文
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|source| LlmError::MalformedOutput {
        raw: text.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_plain_fence() {
        assert_eq!(strip_code_fences("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_no_fence_untouched() {
        assert_eq!(strip_code_fences("  {\"ok\": true} "), "{\"ok\": true}");
    }

    #[test]
    fn test_unclosed_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 2}"), "{\"a\": 2}");
    }

    #[test]
    fn test_parse_model_json_error_keeps_raw() {
        match parse_model_json::<Value>("```json\nnot json\n```") {
            Err(LlmError::MalformedOutput { raw, .. }) => assert!(raw.contains("not json")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
