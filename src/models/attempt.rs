use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Outcome of a submitted attempt, as recorded by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub obtained_marks: u32,
    pub total_marks: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptResult {
    pub fn percentage(&self) -> u32 {
        crate::services::scoring_service::percentage(self.obtained_marks, self.total_marks)
    }

    pub fn incorrect_count(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_count)
    }
}

/// One row of the signed-in user's attempt history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptHistoryEntry {
    pub attempt_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub result: AttemptResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub taken: usize,
    pub average_percentage: u32,
    pub perfect_scores: usize,
}

impl AttemptStats {
    pub fn from_history(history: &[AttemptHistoryEntry]) -> Self {
        if history.is_empty() {
            return Self::default();
        }
        let sum: Decimal = history
            .iter()
            .map(|entry| &entry.result)
            .filter(|result| result.total_marks > 0)
            .map(|result| {
                Decimal::from(result.obtained_marks) * Decimal::ONE_HUNDRED
                    / Decimal::from(result.total_marks)
            })
            .sum();
        let average = (sum / Decimal::from(history.len()))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0);
        let perfect_scores = history
            .iter()
            .filter(|entry| {
                entry.result.total_questions > 0
                    && entry.result.correct_count == entry.result.total_questions
            })
            .count();

        Self {
            taken: history.len(),
            average_percentage: average,
            perfect_scores,
        }
    }
}
