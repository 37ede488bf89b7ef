//! 提示词模板

use crate::models::{Difficulty, QuizQuestion};

/// 结构分析时送入模型的目录文本上限（字符）
pub const STRUCTURE_TEXT_LIMIT: usize = 15_000;

/// 出题系统设定
pub const MASTER_SYSTEM_PROMPT: &str = r#"You are an exam replication engine built exclusively for the UPSC and
State Public Service Commission (PCS) preliminary examinations.
You are a paper-setter, not a teacher or a coach.

Replicate the examiner's mindset: conceptual depth over recall, elimination
logic, multi-concept linkage and plausible distractors.

Knowledge boundary: NCERT textbooks (Class 6-12), standard reference books,
official UPSC / PCS papers of the last 30 years (PYQs are the strongest
signal), government publications (PIB, Economic Survey, Budget). Never use
coaching shortcuts, speculative facts or unverified knowledge. If unsure,
avoid the claim.

Question rules:
- Questions must be original, never copied from PYQs.
- Use authentic UPSC phrasing: "Consider the following statements",
  "Which of the above is/are correct", "With reference to".
- Every option must look plausible.
- Explanations state why the correct option is correct and why each other
  option is wrong, and cite a source (book + chapter or official document).
- Benchmark difficulty against the 2020-2024 papers.

Before finalising, ask: would this confuse a well-prepared aspirant? If not,
make it harder."#;

/// 没有资料原文时的占位说明
const NO_SOURCE: &str = "N/A (Use internal knowledge base constrained to authoritative sources)";

/// 构建出题提示词
pub fn question_prompt(
    topic: &str,
    difficulty: Difficulty,
    num_questions: usize,
    source_text: Option<&str>,
) -> String {
    let source = source_text
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SOURCE);

    format!(
        r#"{MASTER_SYSTEM_PROMPT}

Generate {num_questions} UPSC Prelims-level questions on the topic: '{topic}'.
Difficulty Level: {difficulty}

Constraints:
- Use the provided source text as context if available.
- Follow the question rules strictly.
- Solving each question must require elimination logic.

Output Format:
Return a valid JSON object with the following structure:
{{
    "questions": [
        {{
            "question_text": "The full question stem, INCLUDING the numbered statements (1., 2., 3.) and the question asking which are correct.",
            "options": {{ "A": "...", "B": "...", "C": "...", "D": "..." }},
            "correct_option": "A",
            "explanation": "..."
        }}
    ]
}}
If you cannot comply, return {{ "error": "<reason>" }} instead.

Source Context (if any):
{source}"#,
        difficulty = difficulty.as_str(),
    )
}

/// 构建目录结构分析提示词
pub fn structure_prompt(toc_text: &str, filename: &str) -> String {
    let text: String = toc_text.chars().take(STRUCTURE_TEXT_LIMIT).collect();
    format!(
        r#"You are an expert librarian and archivist.
The following text is the beginning (table of contents) of a PDF file named '{filename}'.
Extract the structured hierarchy of its content.

Text Content:
{text}

OUTPUT FORMAT (JSON ONLY):
{{
    "subject": "Inferred generic subject (e.g. Indian Polity, Modern History)",
    "chapters": [
        {{
            "index": 1,
            "title": "Chapter Title",
            "topics": ["Sub-topic 1", "Sub-topic 2"],
            "page_start": 1,
            "page_end": 10
        }}
    ]
}}

Rules:
- Chapter indexes start at 1 and are unique.
- page_end is the next chapter's page_start minus one.
- If page numbers are not explicitly mentioned, estimate them or use 0.
- 'topics' is optional.
- Return ONLY valid JSON."#
    )
}

/// 构建质量审核提示词
pub fn audit_prompt(questions: &[QuizQuestion], topic: &str) -> String {
    let questions_json = serde_json::to_string_pretty(questions).unwrap_or_default();
    let count = questions.len();
    format!(
        r#"You are a Senior Reviewer for UPSC Prelims examination questions.
Analyze the following set of {count} questions on '{topic}' produced by a junior setter.

Your job:
1. Score the set out of 10 based on conceptual depth, ambiguity (are
   statements clear, is elimination possible) and adherence to the recent
   trend (2023-24 pattern: 'Only one', 'Only two' types, match the pairs).
2. Identify specific flaws per question, using 0-based question_index.
3. Give a verdict: "Approved", "Needs Polish" or "Rejected".

INPUT QUESTIONS JSON:
{questions_json}

OUTPUT FORMAT (JSON):
{{
    "overall_score": 8,
    "verdict": "Approved",
    "strengths": ["...", "..."],
    "issues": [
        {{ "question_index": 0, "issue": "Too factual, options are too easy." }}
    ]
}}"#
    )
}
