use crate::dto::authoring_dto::{QuestionDraft, QuizDraft};
use crate::error::{Error, Result};
use crate::models::question::QuestionType;
use crate::services::store::QuizStore;
use crate::utils::validation::{settings_errors, validate};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// 0-based position of the offending question, `None` for quiz fields.
    pub question_index: Option<usize>,
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn quiz(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            question_index: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn question(index: usize, field: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            question_index: Some(index),
            field: format!("questions[{}].{}", index, field),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn for_question(&self, index: usize) -> impl Iterator<Item = &FieldError> {
        self.errors
            .iter()
            .filter(move |e| e.question_index == Some(index))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

pub struct AuthoringValidator;

impl AuthoringValidator {
    /// Checks a draft in a fixed order and stops at the first violation:
    /// quiz title, description, settings, then each question in document
    /// order (text, options, answer key, marks).
    pub fn validate(draft: &QuizDraft, questions: &[QuestionDraft]) -> Result<()> {
        let first = Self::check_quiz(draft).or_else(|| Self::check_questions(questions));
        match first {
            Some(error) => Err(Error::Validation(ValidationReport {
                errors: vec![error],
            })),
            None => Ok(()),
        }
    }

    pub fn validate_questions(questions: &[QuestionDraft]) -> Result<()> {
        match Self::check_questions(questions) {
            Some(error) => Err(Error::Validation(ValidationReport {
                errors: vec![error],
            })),
            None => Ok(()),
        }
    }

    fn check_quiz(draft: &QuizDraft) -> Option<FieldError> {
        if draft.title.trim().is_empty() {
            return Some(FieldError::quiz("title", "Quiz title is required"));
        }
        if draft.description.trim().is_empty() {
            return Some(FieldError::quiz("description", "Quiz description is required"));
        }
        validate(draft)
            .err()
            .and_then(|errors| settings_errors(&errors).into_iter().next())
    }

    fn check_questions(questions: &[QuestionDraft]) -> Option<FieldError> {
        if questions.is_empty() {
            return Some(FieldError::quiz("questions", "A quiz needs at least one question"));
        }
        questions
            .iter()
            .enumerate()
            .find_map(|(index, q)| Self::check_question(index, q))
    }

    fn check_question(index: usize, q: &QuestionDraft) -> Option<FieldError> {
        let number = index + 1;
        if q.question_text.trim().is_empty() {
            return Some(FieldError::question(
                index,
                "questionText",
                format!("Question {} text is required", number),
            ));
        }

        let question_type = q.question_type;
        if let Some(missing) = question_type
            .required_slots()
            .iter()
            .find(|letter| !q.options.is_populated(**letter))
        {
            let message = match question_type {
                QuestionType::TrueFalse => {
                    format!("Question {} requires both True and False options", number)
                }
                _ => format!("Question {} requires at least 4 options", number),
            };
            return Some(FieldError::question(
                index,
                format!("options.{}", missing),
                message,
            ));
        }

        let populated = q.options.populated(question_type);
        match question_type {
            QuestionType::SingleCorrect | QuestionType::TrueFalse => match q.correct_answer {
                None => Some(FieldError::question(
                    index,
                    "correctAnswer",
                    format!("Question {} requires a correct answer", number),
                )),
                Some(letter) if !populated.contains(&letter) => Some(FieldError::question(
                    index,
                    "correctAnswer",
                    format!(
                        "Question {} correct answer {} does not match a filled option",
                        number, letter
                    ),
                )),
                Some(_) => Self::check_marks(index, q),
            },
            QuestionType::MultipleCorrect => {
                if q.correct_answers.is_empty() {
                    return Some(FieldError::question(
                        index,
                        "correctAnswers",
                        format!("Question {} requires at least one correct answer", number),
                    ));
                }
                if let Some(letter) = q.correct_answers.iter().find(|l| !populated.contains(*l)) {
                    return Some(FieldError::question(
                        index,
                        "correctAnswers",
                        format!(
                            "Question {} correct answer {} does not match a filled option",
                            number, letter
                        ),
                    ));
                }
                Self::check_marks(index, q)
            }
        }
    }

    fn check_marks(index: usize, q: &QuestionDraft) -> Option<FieldError> {
        if q.marks == 0 {
            return Some(FieldError::question(
                index,
                "marks",
                format!("Question {} must be worth at least 1 mark", index + 1),
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedQuestion {
    pub position: usize,
    pub question_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedQuestion {
    pub position: usize,
    pub reason: String,
}

/// Quiz persisted, but some of its questions were not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialCreation {
    pub quiz_id: i64,
    pub created: Vec<CreatedQuestion>,
    pub failed: Vec<FailedQuestion>,
}

impl PartialCreation {
    pub fn failed_positions(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.position).collect()
    }
}

impl fmt::Display for PartialCreation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self
            .failed
            .iter()
            .map(|q| (q.position + 1).to_string())
            .collect();
        write!(
            f,
            "quiz {} saved with {} of {} questions; missing questions: {}",
            self.quiz_id,
            self.created.len(),
            self.created.len() + self.failed.len(),
            positions.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedQuiz {
    pub quiz_id: i64,
    /// Question ids in document order.
    pub question_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct AuthoringService<S> {
    store: S,
}

impl<S: QuizStore> AuthoringService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Question failures are collected into [`Error::PartialCreation`].
    pub async fn publish(&self, draft: &QuizDraft, questions: &[QuestionDraft]) -> Result<PublishedQuiz> {
        AuthoringValidator::validate(draft, questions)?;

        let mut quiz = draft.clone();
        quiz.title = quiz.title.trim().to_string();
        quiz.description = quiz.description.trim().to_string();
        let quiz_id = self.store.create_quiz(quiz).await?;
        info!(quiz_id, questions = questions.len(), "Quiz created, adding questions");

        let positions: Vec<usize> = (0..questions.len()).collect();
        self.add_questions(quiz_id, questions, &positions, Vec::new()).await
    }

    /// Re-adds only the questions a previous publish failed to create.
    pub async fn resume(
        &self,
        questions: &[QuestionDraft],
        partial: &PartialCreation,
    ) -> Result<PublishedQuiz> {
        AuthoringValidator::validate_questions(questions)?;
        let positions = partial.failed_positions();
        if let Some(out_of_range) = positions.iter().find(|p| **p >= questions.len()) {
            return Err(Error::Validation(ValidationReport {
                errors: vec![FieldError::quiz(
                    "questions",
                    format!("Question {} is not part of this quiz", out_of_range + 1),
                )],
            }));
        }
        info!(
            quiz_id = partial.quiz_id,
            missing = positions.len(),
            "Resuming question creation"
        );
        self.add_questions(partial.quiz_id, questions, &positions, partial.created.clone())
            .await
    }

    async fn add_questions(
        &self,
        quiz_id: i64,
        questions: &[QuestionDraft],
        positions: &[usize],
        mut created: Vec<CreatedQuestion>,
    ) -> Result<PublishedQuiz> {
        let mut failed: Vec<FailedQuestion> = Vec::new();
        let mut auth_failure: Option<String> = None;

        for &position in positions {
            if let Some(reason) = &auth_failure {
                failed.push(FailedQuestion {
                    position,
                    reason: reason.clone(),
                });
                continue;
            }

            let order = (position + 1) as u32;
            match self
                .store
                .add_question(quiz_id, questions[position].clone(), order)
                .await
            {
                Ok(question_id) => created.push(CreatedQuestion {
                    position,
                    question_id,
                }),
                Err(e) => {
                    warn!(quiz_id, position, error = %e, "Failed to add question");
                    if matches!(e, Error::Unauthorized(_)) {
                        auth_failure = Some(e.to_string());
                    }
                    failed.push(FailedQuestion {
                        position,
                        reason: e.to_string(),
                    });
                }
            }
        }

        created.sort_by_key(|c| c.position);
        if failed.is_empty() {
            info!(quiz_id, questions = created.len(), "Quiz published");
            return Ok(PublishedQuiz {
                quiz_id,
                question_ids: created.iter().map(|c| c.question_id).collect(),
            });
        }

        Err(Error::PartialCreation(PartialCreation {
            quiz_id,
            created,
            failed,
        }))
    }
}
