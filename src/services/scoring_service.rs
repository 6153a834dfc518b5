use crate::models::answer::Answer;
use crate::models::attempt::AttemptResult;
use crate::models::question::Question;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSheet {
    pub correct_count: u32,
    pub obtained_marks: u32,
    pub total_marks: u32,
    pub per_question_correct: Vec<bool>,
}

impl ScoreSheet {
    pub fn percentage(&self) -> u32 {
        percentage(self.obtained_marks, self.total_marks)
    }

    pub fn passed(&self, passing_percentage: u32) -> bool {
        self.percentage() >= passing_percentage
    }

    pub fn into_result(self, submitted_at: DateTime<Utc>) -> AttemptResult {
        AttemptResult {
            obtained_marks: self.obtained_marks,
            total_marks: self.total_marks,
            correct_count: self.correct_count,
            total_questions: self.per_question_correct.len() as u32,
            submitted_at,
        }
    }
}

pub struct ScoringService;

impl ScoringService {
    /// Scores an encoded answer sequence. Multi-answer questions only count
    /// when the submitted set matches the key exactly.
    pub fn score(questions: &[Question], encoded_answers: &[String]) -> ScoreSheet {
        let mut correct_count = 0;
        let mut obtained_marks = 0;
        let mut total_marks = 0;
        let mut per_question_correct = Vec::with_capacity(questions.len());

        for (idx, q) in questions.iter().enumerate() {
            total_marks += q.marks;
            let submitted = encoded_answers.get(idx).map(String::as_str).unwrap_or_default();
            let is_correct = Self::is_correct(q, submitted);
            if is_correct {
                correct_count += 1;
                obtained_marks += q.marks;
            }
            per_question_correct.push(is_correct);
        }

        ScoreSheet {
            correct_count,
            obtained_marks,
            total_marks,
            per_question_correct,
        }
    }

    pub fn is_correct(question: &Question, submitted: &str) -> bool {
        let letters = Answer::decode_letters(submitted);
        !letters.is_empty() && letters == question.kind.correct_letters()
    }
}

/// `obtained / total * 100`, rounded half-up. Zero when nothing is scored.
pub fn percentage(obtained: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let ratio = Decimal::from(obtained) * Decimal::ONE_HUNDRED / Decimal::from(total);
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}
