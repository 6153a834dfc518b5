use crate::error::{Error, Result};
use crate::models::answer::Answer;
use crate::models::attempt::AttemptResult;
use crate::models::question::{OptionLetter, Question};
use crate::models::quiz::Quiz;
use crate::services::answer_collector::AnswerCollector;
use crate::services::scoring_service::{ScoreSheet, ScoringService};
use crate::services::timer::{Timer, TimerEvent};
use rand::seq::SliceRandom;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Tick,
    Select(OptionLetter),
    Next,
    Prev,
    Submit,
    Retry,
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Loading,
    InProgress,
    Submitting,
    Completed(Box<Completion>),
    Failed(Failure),
}

impl AttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::Loading => "loading",
            AttemptState::InProgress => "in_progress",
            AttemptState::Submitting => "submitting",
            AttemptState::Completed(_) => "completed",
            AttemptState::Failed(f) if f.retryable => "failed_retryable",
            AttemptState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            AttemptState::Completed(_) => true,
            AttemptState::Failed(f) => !f.retryable,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub result: AttemptResult,
    pub review: ScoreSheet,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    QuizUnavailable,
    Unauthorized,
    SubmitFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub reason: FailureReason,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Explicit,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub quiz_id: i64,
    pub answers: Vec<String>,
    pub trigger: SubmitTrigger,
}

#[derive(Debug)]
pub struct QuestionView<'a> {
    pub index: usize,
    pub total: usize,
    pub question: &'a Question,
    /// Options in display order.
    pub options: Vec<(OptionLetter, &'a str)>,
    pub selected: &'a Answer,
}

#[derive(Debug)]
pub struct AttemptSession {
    session_id: Uuid,
    quiz_id: i64,
    user_id: Option<i64>,
    quiz: Option<Quiz>,
    questions: Vec<Question>,
    option_orders: Vec<Vec<OptionLetter>>,
    current_index: usize,
    answers: AnswerCollector,
    timer: Option<Timer>,
    state: AttemptState,
    pending: Option<Submission>,
    review: Option<ScoreSheet>,
    submit_attempts: u32,
    max_submit_retries: u32,
}

impl AttemptSession {
    pub fn new(quiz_id: i64, user_id: Option<i64>, max_submit_retries: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            quiz_id,
            user_id,
            quiz: None,
            questions: Vec::new(),
            option_orders: Vec::new(),
            current_index: 0,
            answers: AnswerCollector::new(Vec::new()),
            timer: None,
            state: AttemptState::Loading,
            pending: None,
            review: None,
            submit_attempts: 0,
            max_submit_retries,
        }
    }

    pub fn on_loaded(&mut self, quiz: Quiz, mut questions: Vec<Question>) -> Result<()> {
        if questions.is_empty() {
            return self.transition(AttemptState::Failed(Failure {
                reason: FailureReason::QuizUnavailable,
                message: format!("Quiz {} has no questions", self.quiz_id),
                retryable: false,
            }));
        }
        self.transition(AttemptState::InProgress)?;

        questions.sort_by_key(|q| q.order);
        let mut rng = rand::thread_rng();
        if quiz.randomize_questions {
            questions.shuffle(&mut rng);
        }
        self.option_orders = questions
            .iter()
            .map(|q| {
                let mut order = q.options.populated(q.question_type());
                if quiz.randomize_options {
                    order.shuffle(&mut rng);
                }
                order
            })
            .collect();

        self.answers = AnswerCollector::for_questions(&questions);
        self.timer = Some(Timer::new(quiz.time_limit_seconds()));
        self.current_index = 0;
        info!(
            session_id = %self.session_id,
            quiz_id = self.quiz_id,
            user_id = ?self.user_id,
            questions = questions.len(),
            seconds = quiz.time_limit_seconds(),
            "Attempt started"
        );
        self.questions = questions;
        self.quiz = Some(quiz);
        Ok(())
    }

    pub fn on_load_failed(&mut self, error: &Error) -> Result<()> {
        warn!(session_id = %self.session_id, quiz_id = self.quiz_id, error = %error, "Quiz load failed");
        let reason = match error {
            Error::Unauthorized(_) => FailureReason::Unauthorized,
            _ => FailureReason::QuizUnavailable,
        };
        self.transition(AttemptState::Failed(Failure {
            reason,
            message: error.user_message(),
            retryable: false,
        }))
    }

    pub fn start_clock(&mut self, events: UnboundedSender<SessionEvent>) {
        if self.state != AttemptState::InProgress {
            return;
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.start(events);
        }
    }

    pub fn select_answer(&mut self, letter: OptionLetter) -> Result<()> {
        if !self.accepts_input("select_answer") {
            return Ok(());
        }
        self.answers.select(self.current_index, letter)
    }

    pub fn next(&mut self) {
        if self.accepts_input("next") && self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.accepts_input("prev") && self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// `Ok(None)` when the session is not accepting a submit. After a
    /// retryable failure this resends the frozen submission.
    pub fn submit(&mut self) -> Result<Option<Submission>> {
        if matches!(&self.state, AttemptState::Failed(f) if f.retryable) {
            return self.retry();
        }
        if !self.accepts_input("submit") {
            return Ok(None);
        }
        if !self.answers.is_complete(self.current_index) {
            return Err(Error::AnswerRequired {
                index: self.current_index,
            });
        }
        self.begin_submit(SubmitTrigger::Explicit).map(Some)
    }

    pub fn tick(&mut self) -> Option<Submission> {
        if self.state != AttemptState::InProgress {
            return None;
        }
        let event = self.timer.as_mut().map(Timer::tick)?;
        match event {
            TimerEvent::Expired => {
                info!(session_id = %self.session_id, "Time is up, submitting");
                self.begin_submit(SubmitTrigger::Expired).ok()
            }
            TimerEvent::Tick { .. } | TimerEvent::Idle => None,
        }
    }

    fn begin_submit(&mut self, trigger: SubmitTrigger) -> Result<Submission> {
        self.transition(AttemptState::Submitting)?;
        self.dispose_timer();

        let answers = self.answers.encode(self.questions.len());
        self.review = Some(ScoringService::score(&self.questions, &answers));
        let submission = Submission {
            quiz_id: self.quiz_id,
            answers,
            trigger,
        };
        self.pending = Some(submission.clone());
        self.submit_attempts += 1;
        info!(
            session_id = %self.session_id,
            trigger = ?trigger,
            answered = self.answers.answered_count(),
            "Submitting attempt"
        );
        Ok(submission)
    }

    pub fn on_submitted(&mut self, result: AttemptResult) -> Result<()> {
        let review = self
            .review
            .clone()
            .unwrap_or_else(|| ScoringService::score(&self.questions, &[]));
        let passing = self.quiz.as_ref().map(|q| q.passing_percentage).unwrap_or(0);
        let passed = result.percentage() >= passing;
        info!(
            session_id = %self.session_id,
            obtained = result.obtained_marks,
            total = result.total_marks,
            passed,
            "Attempt completed"
        );
        self.transition(AttemptState::Completed(Box::new(Completion {
            result,
            review,
            passed,
        })))?;
        self.pending = None;
        Ok(())
    }

    pub fn on_submit_failed(&mut self, error: &Error) -> Result<()> {
        let retryable = error.is_retryable() && self.remaining_retries() > 0;
        let reason = match error {
            Error::Unauthorized(_) => FailureReason::Unauthorized,
            _ => FailureReason::SubmitFailed,
        };
        warn!(
            session_id = %self.session_id,
            attempt = self.submit_attempts,
            retryable,
            error = %error,
            "Submission failed"
        );
        self.transition(AttemptState::Failed(Failure {
            reason,
            message: error.user_message(),
            retryable,
        }))
    }

    pub fn retry(&mut self) -> Result<Option<Submission>> {
        let retryable = matches!(&self.state, AttemptState::Failed(f) if f.retryable);
        if !retryable {
            return Ok(None);
        }
        let Some(submission) = self.pending.clone() else {
            return Ok(None);
        };
        self.transition(AttemptState::Submitting)?;
        self.submit_attempts += 1;
        debug!(session_id = %self.session_id, attempt = self.submit_attempts, "Retrying submission");
        Ok(Some(submission))
    }

    /// Leaves the attempt without contacting the store.
    pub fn abandon(mut self) {
        self.dispose_timer();
        info!(
            session_id = %self.session_id,
            state = self.state.name(),
            "Attempt abandoned"
        );
    }

    fn accepts_input(&self, action: &str) -> bool {
        let open = self.state == AttemptState::InProgress;
        if !open {
            debug!(session_id = %self.session_id, action, state = self.state.name(), "Input ignored");
        }
        open
    }

    fn dispose_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
    }

    fn transition(&mut self, next: AttemptState) -> Result<()> {
        if !can_transition(&self.state, &next) {
            return Err(Error::State {
                from: self.state.name(),
                to: next.name(),
            });
        }
        debug!(session_id = %self.session_id, from = self.state.name(), to = next.name(), "Transition");
        self.state = next;
        if self.state.is_terminal() {
            self.dispose_timer();
        }
        Ok(())
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz_id
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerCollector {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        let index = self.current_index;
        let question = self.questions.get(index)?;
        let options = self.option_orders[index]
            .iter()
            .filter_map(|letter| question.option_text(*letter).map(|text| (*letter, text)))
            .collect();
        Some(QuestionView {
            index,
            total: self.questions.len(),
            question,
            options,
            selected: self.answers.answer(index)?,
        })
    }

    pub fn time_left(&self) -> u32 {
        self.timer.as_ref().map(Timer::remaining).unwrap_or(0)
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.timer.as_ref().map(Timer::elapsed).unwrap_or(0)
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(Timer::is_running)
    }

    pub fn progress_percent(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        crate::services::scoring_service::percentage(
            (self.current_index + 1) as u32,
            self.questions.len() as u32,
        )
    }

    pub fn remaining_retries(&self) -> u32 {
        (self.max_submit_retries + 1).saturating_sub(self.submit_attempts)
    }

    pub fn pending_submission(&self) -> Option<&Submission> {
        self.pending.as_ref()
    }
}

fn can_transition(from: &AttemptState, to: &AttemptState) -> bool {
    use AttemptState::*;
    match (from, to) {
        (Loading, InProgress) | (Loading, Failed(_)) => true,
        (InProgress, Submitting) => true,
        (Submitting, Completed(_)) | (Submitting, Failed(_)) => true,
        (Failed(failure), Submitting) => failure.retryable,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionSet, QuestionKind};
    use crate::models::quiz::{Difficulty, QuizCategory, QuizStatus, QuizVisibility};
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn quiz(minutes: u32) -> Quiz {
        Quiz {
            id: 1,
            title: "Rust".into(),
            description: "Basics".into(),
            category: QuizCategory::Programming,
            difficulty: Difficulty::Easy,
            time_limit_minutes: minutes,
            status: QuizStatus::Published,
            visibility: QuizVisibility::Public,
            passing_percentage: 50,
            max_attempts: 3,
            allow_multiple_attempts: true,
            randomize_questions: false,
            randomize_options: false,
            negative_marking: false,
        }
    }

    fn question(order: u32, kind: QuestionKind, marks: u32) -> Question {
        let options = match kind {
            QuestionKind::TrueFalse { .. } => OptionSet::new()
                .with(OptionLetter::A, "True")
                .with(OptionLetter::B, "False"),
            _ => OptionSet::new()
                .with(OptionLetter::A, "one")
                .with(OptionLetter::B, "two")
                .with(OptionLetter::C, "three")
                .with(OptionLetter::D, "four"),
        };
        Question {
            id: order as i64,
            quiz_id: 1,
            question_text: format!("Question {}", order),
            options,
            kind,
            explanation: None,
            marks,
            order,
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            question(
                1,
                QuestionKind::SingleCorrect {
                    correct_answer: OptionLetter::B,
                },
                2,
            ),
            question(
                2,
                QuestionKind::TrueFalse {
                    correct_answer: OptionLetter::A,
                },
                1,
            ),
        ]
    }

    fn started(minutes: u32) -> AttemptSession {
        let mut session = AttemptSession::new(1, Some(9), 2);
        session.on_loaded(quiz(minutes), questions()).unwrap();
        session
    }

    fn result(obtained: u32, total: u32) -> AttemptResult {
        AttemptResult {
            obtained_marks: obtained,
            total_marks: total,
            correct_count: 1,
            total_questions: 2,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn load_starts_at_first_question_with_full_clock() {
        let session = started(15);
        assert_eq!(session.state(), &AttemptState::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.time_left(), 900);
        assert_eq!(session.answers().answered_count(), 0);
        let view = session.current_question().unwrap();
        assert_eq!(view.total, 2);
        assert_eq!(view.options.len(), 4);
    }

    #[test]
    fn load_failure_is_terminal() {
        let mut session = AttemptSession::new(5, None, 2);
        session
            .on_load_failed(&Error::NotFound("quiz 5".into()))
            .unwrap();
        match session.state() {
            AttemptState::Failed(f) => {
                assert_eq!(f.reason, FailureReason::QuizUnavailable);
                assert!(!f.retryable);
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(session.state().is_terminal());
    }

    #[test]
    fn quiz_without_questions_is_unavailable() {
        let mut session = AttemptSession::new(1, None, 2);
        session.on_loaded(quiz(5), Vec::new()).unwrap();
        assert!(session.state().is_terminal());
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = started(5);
        session.prev();
        assert_eq!(session.current_index(), 0);
        session.next();
        session.next();
        session.next();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.progress_percent(), 100);
    }

    #[test]
    fn explicit_submit_requires_current_answer() {
        let mut session = started(5);
        let result = session.submit();
        assert!(matches!(result, Err(Error::AnswerRequired { index: 0 })));
        assert_eq!(session.state(), &AttemptState::InProgress);
        assert!(session.is_timer_running());
    }

    #[test]
    fn explicit_submit_encodes_every_position() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        let submission = session.submit().unwrap().unwrap();
        assert_eq!(submission.answers, vec!["B".to_string(), String::new()]);
        assert_eq!(submission.trigger, SubmitTrigger::Explicit);
        assert_eq!(session.state(), &AttemptState::Submitting);
        assert!(!session.is_timer_running());
    }

    #[test]
    fn input_is_locked_while_submitting() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        session.submit().unwrap();

        session.select_answer(OptionLetter::C).unwrap();
        session.next();
        assert_eq!(session.current_index(), 0);
        assert_eq!(
            session.answers().answer(0),
            Some(&Answer::Single(OptionLetter::B))
        );
        assert_eq!(session.submit().unwrap(), None);
        assert_eq!(session.tick(), None);
    }

    #[test]
    fn expiry_submits_regardless_of_answers() {
        let mut session = AttemptSession::new(1, None, 2);
        session.on_loaded(quiz(1), questions()).unwrap();
        session.next();

        let mut submission = None;
        for _ in 0..60 {
            if let Some(s) = session.tick() {
                submission = Some(s);
                break;
            }
        }
        let submission = submission.expect("expiry should submit");
        assert_eq!(submission.trigger, SubmitTrigger::Expired);
        assert_eq!(submission.answers, vec![String::new(), String::new()]);
        assert_eq!(session.time_left(), 0);

        session.on_submitted(result(0, 3)).unwrap();
        match session.state() {
            AttemptState::Completed(done) => {
                assert_eq!(done.review.correct_count, 0);
                assert!(!done.passed);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn first_submit_wins_over_expiry() {
        let mut session = AttemptSession::new(1, None, 2);
        session.on_loaded(quiz(0), questions()).unwrap();
        session.select_answer(OptionLetter::B).unwrap();
        assert!(session.submit().unwrap().is_some());
        assert_eq!(session.tick(), None);
        assert_eq!(session.state(), &AttemptState::Submitting);
    }

    #[test]
    fn network_failure_is_retryable_until_exhausted() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        let first = session.submit().unwrap().unwrap();

        let network = Error::Network("timeout".into());
        session.on_submit_failed(&network).unwrap();
        assert!(!session.state().is_terminal());
        assert_eq!(session.retry().unwrap(), Some(first.clone()));

        session.on_submit_failed(&network).unwrap();
        assert_eq!(session.retry().unwrap(), Some(first));

        session.on_submit_failed(&network).unwrap();
        assert!(session.state().is_terminal());
        assert_eq!(session.retry().unwrap(), None);
    }

    #[test]
    fn submit_after_retryable_failure_resends() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        let first = session.submit().unwrap().unwrap();
        session
            .on_submit_failed(&Error::Network("timeout".into()))
            .unwrap();

        let again = session.submit().unwrap();
        assert_eq!(again, Some(first));
        assert_eq!(session.state(), &AttemptState::Submitting);
        assert_eq!(session.remaining_retries(), 1);
    }

    #[test]
    fn auth_failure_is_terminal() {
        let mut session = started(5);
        session.select_answer(OptionLetter::A).unwrap();
        session.submit().unwrap();
        session
            .on_submit_failed(&Error::Unauthorized("expired".into()))
            .unwrap();
        match session.state() {
            AttemptState::Failed(f) => {
                assert_eq!(f.reason, FailureReason::Unauthorized);
                assert!(!f.retryable);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn completed_session_rejects_further_transitions() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        session.submit().unwrap();
        session.on_submitted(result(3, 3)).unwrap();

        assert!(matches!(
            session.on_submitted(result(3, 3)),
            Err(Error::State { from: "completed", .. })
        ));
        assert!(matches!(
            session.on_loaded(quiz(5), questions()),
            Err(Error::State { .. })
        ));
        assert_eq!(session.retry().unwrap(), None);
    }

    #[test]
    fn multi_select_questions_toggle_through_the_session() {
        let mut session = AttemptSession::new(1, None, 0);
        let multi = question(
            1,
            QuestionKind::MultipleCorrect {
                correct_answers: BTreeSet::from([OptionLetter::A, OptionLetter::C]),
            },
            1,
        );
        session.on_loaded(quiz(5), vec![multi]).unwrap();
        session.select_answer(OptionLetter::C).unwrap();
        session.select_answer(OptionLetter::A).unwrap();
        session.select_answer(OptionLetter::D).unwrap();
        session.select_answer(OptionLetter::D).unwrap();

        let submission = session.submit().unwrap().unwrap();
        assert_eq!(submission.answers, vec!["AC".to_string()]);
        assert_eq!(session.remaining_retries(), 0);
    }

    #[test]
    fn randomized_options_keep_the_same_letters() {
        let mut shuffled = quiz(5);
        shuffled.randomize_options = true;
        shuffled.randomize_questions = true;
        let mut session = AttemptSession::new(1, None, 1);
        session.on_loaded(shuffled, questions()).unwrap();

        for _ in 0..2 {
            let view = session.current_question().unwrap();
            let mut letters: Vec<OptionLetter> = view.options.iter().map(|(l, _)| *l).collect();
            letters.sort();
            let expected = view.question.options.populated(view.question.question_type());
            assert_eq!(letters, expected);
            session.next();
        }
    }

    #[test]
    fn abandon_leaves_no_pending_submission() {
        let mut session = started(5);
        session.select_answer(OptionLetter::B).unwrap();
        assert!(session.pending_submission().is_none());
        session.abandon();
    }
}
