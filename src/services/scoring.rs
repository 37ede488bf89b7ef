//! 评分服务
//!
//! 按 UPSC 预考规则计分：答对 +2，答错 -0.66，未答 0。

use serde::Serialize;

use crate::models::{OptionKey, QuizQuestion};

pub const MARKS_CORRECT: f64 = 2.0;
pub const MARKS_WRONG: f64 = -0.66;

/// 单题结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

impl Outcome {
    pub fn marks(self) -> f64 {
        match self {
            Outcome::Correct => MARKS_CORRECT,
            Outcome::Wrong => MARKS_WRONG,
            Outcome::Skipped => 0.0,
        }
    }
}

/// 整套题的得分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub score: f64,
    pub max_score: f64,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub outcomes: Vec<Outcome>,
}

/// 计算得分
///
/// `answers[i]` 对应第 i 题；缺失或为 `None` 视为未作答。
pub fn score_quiz(questions: &[QuizQuestion], answers: &[Option<OptionKey>]) -> ScoreCard {
    let outcomes: Vec<Outcome> = questions
        .iter()
        .enumerate()
        .map(|(i, question)| match answers.get(i).copied().flatten() {
            None => Outcome::Skipped,
            Some(answer) if answer == question.correct_option => Outcome::Correct,
            Some(_) => Outcome::Wrong,
        })
        .collect();

    let count = |target: Outcome| outcomes.iter().filter(|o| **o == target).count();
    let raw: f64 = outcomes.iter().map(|o| o.marks()).sum();

    ScoreCard {
        score: (raw * 100.0).round() / 100.0,
        max_score: MARKS_CORRECT * questions.len() as f64,
        correct: count(Outcome::Correct),
        wrong: count(Outcome::Wrong),
        skipped: count(Outcome::Skipped),
        outcomes,
    }
}
