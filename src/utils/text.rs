//! 题干排版

use regex::Regex;
use std::sync::OnceLock;

fn statement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)(^|\s)(\d+\.)\s").expect("valid regex"))
}

fn which_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*(Which of the (?:above |following )?statements)").expect("valid regex"))
}

/// 把行内的编号陈述（"1. ... 2. ..."）拆到单独的行，并在设问句前空一行
pub fn format_statements(text: &str) -> String {
    let split = statement_re().replace_all(text.trim(), "\n$2 ");
    let split = which_re().replace_all(&split, "\n\n$1");
    split
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_statements_split() {
        let text = "Consider the following statements: 1. Alpha is true. 2. Beta is false. Which of the statements given above is/are correct?";
        let formatted = format_statements(text);
        assert_eq!(
            formatted,
            "Consider the following statements:\n1. Alpha is true.\n2. Beta is false.\n\nWhich of the statements given above is/are correct?"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(
            format_statements("With reference to the Preamble, what is meant by 'sovereign'?"),
            "With reference to the Preamble, what is meant by 'sovereign'?"
        );
    }
}
