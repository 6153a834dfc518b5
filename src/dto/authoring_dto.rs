use crate::models::question::{OptionLetter, OptionSet, QuestionType};
use crate::models::quiz::{Difficulty, QuizCategory, QuizStatus, QuizVisibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Quiz settings as entered by an author, before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub category: QuizCategory,
    pub difficulty: Difficulty,
    #[validate(range(min = 1, message = "Time limit must be at least 1 minute"))]
    pub time_limit_minutes: u32,
    pub status: QuizStatus,
    pub visibility: QuizVisibility,
    #[validate(range(max = 100, message = "Passing percentage must be between 0 and 100"))]
    pub passing_percentage: u32,
    #[validate(range(min = 1, message = "Max attempts must be at least 1"))]
    pub max_attempts: u32,
    pub allow_multiple_attempts: bool,
    pub randomize_questions: bool,
    pub randomize_options: bool,
    pub negative_marking: bool,
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: QuizCategory::Java,
            difficulty: Difficulty::Medium,
            time_limit_minutes: 30,
            status: QuizStatus::Draft,
            visibility: QuizVisibility::Public,
            passing_percentage: 60,
            max_attempts: 3,
            allow_multiple_attempts: true,
            randomize_questions: false,
            randomize_options: false,
            negative_marking: false,
        }
    }
}

/// One question as edited in the authoring form. Every field is present
/// regardless of type, so a draft may be internally inconsistent until it
/// passes `AuthoringValidator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: OptionSet,
    pub correct_answer: Option<OptionLetter>,
    pub correct_answers: BTreeSet<OptionLetter>,
    pub explanation: Option<String>,
    pub marks: u32,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            question_text: String::new(),
            question_type: QuestionType::SingleCorrect,
            options: OptionSet::new(),
            correct_answer: None,
            correct_answers: BTreeSet::new(),
            explanation: None,
            marks: 1,
        }
    }
}

impl QuestionDraft {
    pub fn single_correct(text: impl Into<String>, options: &[&str], correct: OptionLetter) -> Self {
        Self {
            question_text: text.into(),
            question_type: QuestionType::SingleCorrect,
            options: options_from(options),
            correct_answer: Some(correct),
            ..Self::default()
        }
    }

    pub fn multiple_correct(
        text: impl Into<String>,
        options: &[&str],
        correct: impl IntoIterator<Item = OptionLetter>,
    ) -> Self {
        Self {
            question_text: text.into(),
            question_type: QuestionType::MultipleCorrect,
            options: options_from(options),
            correct_answers: correct.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn true_false(text: impl Into<String>, correct: OptionLetter) -> Self {
        Self {
            question_text: text.into(),
            question_type: QuestionType::TrueFalse,
            options: options_from(&["True", "False"]),
            correct_answer: Some(correct),
            ..Self::default()
        }
    }

    pub fn with_marks(mut self, marks: u32) -> Self {
        self.marks = marks;
        self
    }
}

fn options_from(texts: &[&str]) -> OptionSet {
    OptionLetter::ALL
        .iter()
        .zip(texts)
        .fold(OptionSet::new(), |set, (letter, text)| set.with(*letter, *text))
}

/// A quiz draft together with its questions, as read from an authoring file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizBundle {
    pub quiz: QuizDraft,
    pub questions: Vec<QuestionDraft>,
}
