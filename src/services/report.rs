//! 成绩报告导出
//!
//! 用 printpdf 的内置字体生成 A4 成绩单：标题、主题、难度、得分统计，
//! 以及每道题的题干、作答、正确答案与解析。内容过长时自动换行分页。

use printpdf::{
    BuiltinFont, Color, Greyscale, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, Rgb,
    TextItem,
};
use tracing::{debug, warn};

use crate::models::{Difficulty, OptionKey, QuizQuestion};
use crate::services::scoring::{Outcome, ScoreCard};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 20.0;
const TOP_MM: f32 = 277.0;
const BOTTOM_MM: f32 = 20.0;
/// 10pt Helvetica 在 170mm 宽度内大约容纳的字符数
const WRAP_WIDTH: usize = 95;

/// 导出报告所需的数据
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub topic: &'a str,
    pub difficulty: Difficulty,
    pub questions: &'a [QuizQuestion],
    pub answers: &'a [Option<OptionKey>],
    pub score: &'a ScoreCard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Style {
    Title,
    Heading,
    Body,
    Correct,
    Wrong,
    Muted,
}

impl Style {
    fn font(self) -> BuiltinFont {
        match self {
            Style::Title | Style::Heading => BuiltinFont::HelveticaBold,
            Style::Muted => BuiltinFont::HelveticaOblique,
            _ => BuiltinFont::Helvetica,
        }
    }

    fn size(self) -> f32 {
        match self {
            Style::Title => 18.0,
            Style::Heading => 12.0,
            _ => 10.0,
        }
    }

    /// 行距（毫米）
    fn advance(self) -> f32 {
        match self {
            Style::Title => 10.0,
            Style::Heading => 7.0,
            _ => 5.0,
        }
    }

    fn color(self) -> Color {
        let rgb = |r, g, b| {
            Color::Rgb(Rgb {
                r,
                g,
                b,
                icc_profile: None,
            })
        };
        match self {
            Style::Title => rgb(0.16, 0.4, 0.69),
            Style::Correct => rgb(0.13, 0.55, 0.13),
            Style::Wrong => rgb(0.75, 0.15, 0.15),
            Style::Muted => Color::Greyscale(Greyscale::new(0.4, None)),
            _ => Color::Greyscale(Greyscale::new(0.08, None)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ReportLine {
    text: String,
    style: Style,
}

/// 生成 PDF 成绩单
pub fn render_results_pdf(input: &ReportInput<'_>) -> Vec<u8> {
    let lines = build_lines(input);
    let pages = paginate(&lines);
    debug!("报告共 {} 行, {} 页", lines.len(), pages.len());

    let pdf_pages: Vec<PdfPage> = pages
        .iter()
        .map(|page| {
            let mut ops = Vec::new();
            let mut y = TOP_MM;
            for line in page {
                push_text(&mut ops, y, line);
                y -= line.style.advance();
            }
            PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
        })
        .collect();

    let mut warnings = Vec::new();
    let bytes = PdfDocument::new("UPSC Practice Report")
        .with_pages(pdf_pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!("生成报告时出现 {} 条警告", warnings.len());
    }
    bytes
}

fn push_text(ops: &mut Vec<Op>, y: f32, line: &ReportLine) {
    let font = line.style.font();
    ops.extend([
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point::new(Mm(MARGIN_LEFT_MM), Mm(y)),
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(line.style.size()),
            font,
        },
        Op::SetLineHeight {
            lh: Pt(line.style.size() + 2.0),
        },
        Op::SetFillColor {
            col: line.style.color(),
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.text.clone())],
            font,
        },
        Op::EndTextSection,
    ]);
}

fn build_lines(input: &ReportInput<'_>) -> Vec<ReportLine> {
    let mut lines = Vec::new();
    let mut push = |text: String, style: Style| {
        for chunk in wrap_text(&to_builtin_charset(&text), WRAP_WIDTH) {
            lines.push(ReportLine { text: chunk, style });
        }
    };

    push("UPSC Prelims Practice Report".to_string(), Style::Title);
    push(format!("Topic: {}", input.topic), Style::Body);
    push(
        format!("Difficulty: {} ({})", input.difficulty.label(), input.difficulty),
        Style::Body,
    );
    push(
        format!(
            "Final Score: {:.2} / {:.0}",
            input.score.score, input.score.max_score
        ),
        Style::Heading,
    );
    push(
        format!(
            "Correct: {}   Wrong: {}   Skipped: {}",
            input.score.correct, input.score.wrong, input.score.skipped
        ),
        Style::Body,
    );
    push(String::new(), Style::Body);

    for (i, question) in input.questions.iter().enumerate() {
        let answer = input.answers.get(i).copied().flatten();
        let outcome = input.score.outcomes.get(i).copied().unwrap_or(Outcome::Skipped);

        push(format!("Q{}.", i + 1), Style::Heading);
        for paragraph in question.question_text.lines() {
            push(paragraph.to_string(), Style::Body);
        }
        for (key, text) in &question.options {
            push(format!("  ({}) {}", key, text), Style::Body);
        }

        let your_answer = match answer {
            Some(key) => format!("Your answer: {}", key),
            None => "Your answer: not attempted".to_string(),
        };
        let style = match outcome {
            Outcome::Correct => Style::Correct,
            Outcome::Wrong => Style::Wrong,
            Outcome::Skipped => Style::Muted,
        };
        push(your_answer, style);
        push(format!("Correct answer: {}", question.correct_option), Style::Body);
        if !question.explanation.trim().is_empty() {
            push(format!("Explanation: {}", question.explanation), Style::Muted);
        }
        push(String::new(), Style::Body);
    }

    lines
}

/// 按页面可用高度切分
fn paginate(lines: &[ReportLine]) -> Vec<Vec<ReportLine>> {
    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut y = TOP_MM;

    for line in lines {
        if y - line.style.advance() < BOTTOM_MM && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            y = TOP_MM;
        }
        // 页首的空行没有意义
        if current.is_empty() && line.text.is_empty() {
            continue;
        }
        y -= line.style.advance();
        current.push(line.clone());
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// 按单词换行；超长单词强制截断
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            lines.push(head);
        }
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// 内置字体只覆盖 Latin-1，其余字符替换为 '?'
fn to_builtin_charset(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if (c as u32) < 0x100 && !c.is_control() => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::score_quiz;
    use std::collections::BTreeMap;

    fn question(i: usize) -> QuizQuestion {
        let options: BTreeMap<OptionKey, String> = OptionKey::ALL
            .iter()
            .map(|k| (*k, format!("Option {} for question {}", k, i)))
            .collect();
        QuizQuestion {
            question_text: format!(
                "Consider the following statements about item {}:\n1. It is listed in the Seventh Schedule.\n2. It was added by the 42nd Amendment.\nWhich of the statements given above is/are correct?",
                i
            ),
            options,
            correct_option: OptionKey::B,
            explanation: "The 42nd Amendment moved several subjects to the Concurrent List.".to_string(),
        }
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_builtin_charset() {
        assert_eq!(to_builtin_charset("“Lok Sabha” – café"), "\"Lok Sabha\" - café");
        assert_eq!(to_builtin_charset("भारत"), "????");
    }

    #[test]
    fn test_long_report_is_paginated() {
        let questions: Vec<QuizQuestion> = (1..=20).map(question).collect();
        let answers: Vec<Option<OptionKey>> = (0..20)
            .map(|i| match i % 3 {
                0 => Some(OptionKey::B),
                1 => Some(OptionKey::A),
                _ => None,
            })
            .collect();
        let score = score_quiz(&questions, &answers);
        let input = ReportInput {
            topic: "Mock Test",
            difficulty: Difficulty::Extreme,
            questions: &questions,
            answers: &answers,
            score: &score,
        };

        let lines = build_lines(&input);
        assert_eq!(lines[0].text, "UPSC Prelims Practice Report");
        assert!(lines.iter().any(|l| l.text == "Your answer: not attempted" && l.style == Style::Muted));
        assert!(lines.iter().any(|l| l.text == "Your answer: A" && l.style == Style::Wrong));

        let pages = paginate(&lines);
        assert!(pages.len() > 1);
        assert!(pages.iter().map(Vec::len).sum::<usize>() <= lines.len());
        for page in &pages {
            let height: f32 = page.iter().map(|l| l.style.advance()).sum();
            assert!(height <= TOP_MM - BOTTOM_MM);
        }

        let bytes = render_results_pdf(&input);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_report_has_one_page() {
        let score = score_quiz(&[], &[]);
        let input = ReportInput {
            topic: "Nothing",
            difficulty: Difficulty::Easy,
            questions: &[],
            answers: &[],
            score: &score,
        };
        assert_eq!(paginate(&build_lines(&input)).len(), 1);
        assert!(render_results_pdf(&input).starts_with(b"%PDF"));
    }
}
