use crate::dto::authoring_dto::QuestionDraft;
use crate::error::{Error, Result};
use crate::models::attempt::{AttemptHistoryEntry, AttemptResult};
use crate::models::question::{OptionLetter, OptionSet, Question, QuestionKind, QuestionType};
use crate::utils::time::{now, parse_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<i64>,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default)]
    pub option_e: Option<String>,
    #[serde(default)]
    pub option_f: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<CorrectAnswers>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_order: Option<u32>,
}

/// The store keeps multi-answer keys comma-joined; newer payloads send a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswers {
    List(Vec<String>),
    Joined(String),
}

impl CorrectAnswers {
    fn letters(&self) -> std::result::Result<BTreeSet<OptionLetter>, String> {
        let raw: Vec<&str> = match self {
            CorrectAnswers::List(items) => items.iter().map(String::as_str).collect(),
            CorrectAnswers::Joined(joined) => joined.split(',').collect(),
        };
        raw.into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<OptionLetter>)
            .collect()
    }
}

impl QuestionRecord {
    fn option_fields(&self) -> [(OptionLetter, &Option<String>); 6] {
        [
            (OptionLetter::A, &self.option_a),
            (OptionLetter::B, &self.option_b),
            (OptionLetter::C, &self.option_c),
            (OptionLetter::D, &self.option_d),
            (OptionLetter::E, &self.option_e),
            (OptionLetter::F, &self.option_f),
        ]
    }

    pub fn from_draft(draft: &QuestionDraft, order: u32) -> Self {
        let text = |letter: OptionLetter| draft.options.get(letter).map(str::to_string);
        let question_type = draft.question_type;
        let (correct_answer, correct_answers) = if question_type.is_multi_select() {
            let joined = draft
                .correct_answers
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(",");
            (None, Some(CorrectAnswers::Joined(joined)))
        } else {
            (draft.correct_answer.map(|l| l.to_string()), None)
        };

        let extra = |letter: OptionLetter| {
            if question_type.accepts(letter) {
                text(letter)
            } else {
                None
            }
        };

        Self {
            id: None,
            quiz_id: None,
            question_text: draft.question_text.trim().to_string(),
            question_type: Some(question_type),
            option_a: text(OptionLetter::A),
            option_b: text(OptionLetter::B),
            option_c: extra(OptionLetter::C),
            option_d: extra(OptionLetter::D),
            option_e: extra(OptionLetter::E),
            option_f: extra(OptionLetter::F),
            correct_answer,
            correct_answers,
            explanation: draft
                .explanation
                .as_ref()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            marks: Some(draft.marks),
            question_order: Some(order),
        }
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = Error;

    fn try_from(record: QuestionRecord) -> Result<Self> {
        let id = record.id.unwrap_or_default();
        let malformed = |msg: String| Error::Malformed(format!("question {}: {}", id, msg));

        let question_type = record.question_type.unwrap_or(QuestionType::SingleCorrect);
        let mut options = OptionSet::new();
        for (letter, text) in record.option_fields() {
            if let Some(text) = text {
                options.set(letter, text.clone());
            }
        }

        let single = |raw: &Option<String>| -> Result<OptionLetter> {
            let raw = raw
                .as_deref()
                .ok_or_else(|| malformed("missing correct answer".to_string()))?;
            raw.parse::<OptionLetter>().map_err(malformed)
        };

        let kind = match question_type {
            QuestionType::SingleCorrect => QuestionKind::SingleCorrect {
                correct_answer: single(&record.correct_answer)?,
            },
            QuestionType::TrueFalse => QuestionKind::TrueFalse {
                correct_answer: single(&record.correct_answer)?,
            },
            QuestionType::MultipleCorrect => {
                let correct_answers = record
                    .correct_answers
                    .as_ref()
                    .map(CorrectAnswers::letters)
                    .transpose()
                    .map_err(malformed)?
                    .unwrap_or_default();
                if correct_answers.is_empty() {
                    return Err(malformed("missing correct answers".to_string()));
                }
                QuestionKind::MultipleCorrect { correct_answers }
            }
        };

        Ok(Question {
            id,
            quiz_id: record.quiz_id.unwrap_or_default(),
            question_text: record.question_text,
            options,
            kind,
            explanation: record.explanation,
            marks: record.marks.unwrap_or(1),
            order: record.question_order.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswersPayload {
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResource {
    pub id: i64,
}

/// Attempt row returned by the submit and history endpoints. Rows without
/// mark totals count one mark per question.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub quiz_id: Option<i64>,
    pub total_questions: u32,
    #[serde(alias = "correctCount", alias = "score", default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_marks: Option<u32>,
    #[serde(default)]
    pub obtained_marks: Option<f64>,
    #[serde(alias = "dateTaken", default)]
    pub submitted_at: Option<String>,
}

impl From<AttemptRecord> for AttemptResult {
    fn from(record: AttemptRecord) -> Self {
        let correct_count = record.correct_answers.min(record.total_questions);
        let total_marks = record.total_marks.unwrap_or(record.total_questions);
        let obtained = match record.obtained_marks {
            Some(marks) => marks.round().max(0.0) as u32,
            None => correct_count,
        };
        let submitted_at = record
            .submitted_at
            .as_deref()
            .and_then(|raw| parse_timestamp(raw).ok())
            .unwrap_or_else(now);

        AttemptResult {
            obtained_marks: obtained.min(total_marks),
            total_marks,
            correct_count,
            total_questions: record.total_questions,
            submitted_at,
        }
    }
}

impl From<AttemptRecord> for AttemptHistoryEntry {
    fn from(record: AttemptRecord) -> Self {
        AttemptHistoryEntry {
            attempt_id: record.id,
            quiz_id: record.quiz_id,
            result: record.into(),
        }
    }
}
