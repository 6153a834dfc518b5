#![allow(dead_code)]

use quiz_engine::dto::authoring_dto::{QuestionDraft, QuizDraft};
use quiz_engine::error::{Error, Result};
use quiz_engine::models::attempt::{AttemptHistoryEntry, AttemptResult};
use quiz_engine::models::question::{OptionLetter, OptionSet, Question, QuestionKind};
use quiz_engine::models::quiz::Quiz;
use quiz_engine::services::attempt_service::SessionObserver;
use quiz_engine::services::attempt_session::AttemptSession;
use quiz_engine::services::scoring_service::ScoringService;
use quiz_engine::services::store::QuizStore;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct FakeState {
    pub quiz: Option<Quiz>,
    /// Extra quizzes returned by `list_quizzes` alongside `quiz`.
    pub catalog: Vec<Quiz>,
    pub history: Vec<AttemptHistoryEntry>,
    pub questions: Vec<Question>,
    pub submit_failures: VecDeque<Error>,
    pub submit_calls: usize,
    pub submissions: Vec<Vec<String>>,
    pub created_quizzes: Vec<QuizDraft>,
    /// Failures for `add_question`, keyed by question order; each fires once.
    pub add_failures: HashMap<u32, Error>,
    pub added_questions: Vec<(i64, u32, QuestionDraft)>,
}

/// In-memory store that scores submissions with the real scorer.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeStore {
    pub fn with_quiz(quiz: Quiz, questions: Vec<Question>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state();
            state.quiz = Some(quiz);
            state.questions = questions;
        }
        store
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl QuizStore for FakeStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        let state = self.state();
        Ok(state.quiz.iter().chain(&state.catalog).cloned().collect())
    }

    async fn fetch_quiz(&self, quiz_id: i64) -> Result<Quiz> {
        self.state()
            .quiz
            .clone()
            .filter(|q| q.id == quiz_id)
            .ok_or_else(|| Error::NotFound(format!("quiz {}", quiz_id)))
    }

    async fn fetch_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let state = self.state();
        Ok(state
            .questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn submit_answers(&self, quiz_id: i64, answers: Vec<String>) -> Result<AttemptResult> {
        let mut state = self.state();
        state.submit_calls += 1;
        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }
        let sheet = ScoringService::score(&state.questions, &answers);
        state.submissions.push(answers);
        let result = sheet.into_result(chrono::Utc::now());
        let attempt_id = state.history.len() as i64 + 1;
        state.history.push(AttemptHistoryEntry {
            attempt_id: Some(attempt_id),
            quiz_id: Some(quiz_id),
            result: result.clone(),
        });
        Ok(result)
    }

    async fn fetch_my_attempts(&self) -> Result<Vec<AttemptHistoryEntry>> {
        Ok(self.state().history.clone())
    }

    async fn create_quiz(&self, draft: QuizDraft) -> Result<i64> {
        let mut state = self.state();
        state.created_quizzes.push(draft);
        Ok(100 + state.created_quizzes.len() as i64)
    }

    async fn add_question(&self, quiz_id: i64, question: QuestionDraft, order: u32) -> Result<i64> {
        let mut state = self.state();
        if let Some(error) = state.add_failures.remove(&order) {
            return Err(error);
        }
        state.added_questions.push((quiz_id, order, question));
        Ok(1000 + state.added_questions.len() as i64)
    }
}

#[derive(Default)]
pub struct Recorder {
    pub states: Vec<&'static str>,
    pub notices: Vec<String>,
}

impl SessionObserver for Recorder {
    fn render(&mut self, session: &AttemptSession) {
        let name = session.state().name();
        if self.states.last() != Some(&name) {
            self.states.push(name);
        }
    }

    fn notice(&mut self, error: &Error) {
        self.notices.push(error.user_message());
    }
}

pub fn quiz(id: i64, minutes: u32, passing: u32) -> Quiz {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": "Rust fundamentals",
        "description": "Ownership and borrowing",
        "category": "PROGRAMMING",
        "difficulty": "EASY",
        "timeLimitMinutes": minutes,
        "status": "PUBLISHED",
        "passingPercentage": passing
    }))
    .unwrap()
}

/// Q1: SINGLE_CORRECT, key B, 2 marks. Q2: TRUE_FALSE, key A, 1 mark.
pub fn mixed_questions(quiz_id: i64) -> Vec<Question> {
    vec![
        Question {
            id: 1,
            quiz_id,
            question_text: "Which keyword moves a closure's captures?".into(),
            options: OptionSet::new()
                .with(OptionLetter::A, "ref")
                .with(OptionLetter::B, "move")
                .with(OptionLetter::C, "static")
                .with(OptionLetter::D, "dyn"),
            kind: QuestionKind::SingleCorrect {
                correct_answer: OptionLetter::B,
            },
            explanation: Some("`move` transfers ownership into the closure.".into()),
            marks: 2,
            order: 1,
        },
        Question {
            id: 2,
            quiz_id,
            question_text: "A &mut borrow is exclusive.".into(),
            options: OptionSet::new()
                .with(OptionLetter::A, "True")
                .with(OptionLetter::B, "False"),
            kind: QuestionKind::TrueFalse {
                correct_answer: OptionLetter::A,
            },
            explanation: None,
            marks: 1,
            order: 2,
        },
    ]
}
