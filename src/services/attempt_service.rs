use crate::error::{Error, Result};
use crate::services::attempt_session::{AttemptSession, SessionEvent, Submission};
use crate::services::store::QuizStore;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Receives session snapshots while an attempt runs.
pub trait SessionObserver {
    fn render(&mut self, session: &AttemptSession);

    /// Input that was rejected without changing the session, such as a
    /// submit on an unanswered question.
    fn notice(&mut self, error: &Error);
}

#[derive(Debug)]
pub enum RunOutcome {
    Finished(AttemptSession),
    Abandoned,
}

#[derive(Clone)]
pub struct AttemptService<S> {
    store: S,
    max_submit_retries: u32,
}

impl<S: QuizStore> AttemptService<S> {
    pub fn new(store: S, max_submit_retries: u32) -> Self {
        Self {
            store,
            max_submit_retries,
        }
    }

    /// A failed fetch still yields a session, parked in `Failed`.
    pub async fn load(&self, quiz_id: i64, user_id: Option<i64>) -> Result<AttemptSession> {
        let mut session = AttemptSession::new(quiz_id, user_id, self.max_submit_retries);
        let fetched = tokio::try_join!(
            self.store.fetch_quiz(quiz_id),
            self.store.fetch_questions(quiz_id)
        );
        match fetched {
            Ok((quiz, questions)) => session.on_loaded(quiz, questions)?,
            Err(e) => session.on_load_failed(&e)?,
        }
        Ok(session)
    }

    pub async fn deliver(&self, session: &mut AttemptSession, submission: Submission) -> Result<()> {
        match self
            .store
            .submit_answers(submission.quiz_id, submission.answers)
            .await
        {
            Ok(result) => session.on_submitted(result),
            Err(e) => session.on_submit_failed(&e),
        }
    }

    pub async fn retry(&self, session: &mut AttemptSession) -> Result<()> {
        match session.retry()? {
            Some(submission) => self.deliver(session, submission).await,
            None => Ok(()),
        }
    }

    pub async fn run<O: SessionObserver>(
        &self,
        mut session: AttemptSession,
        sender: UnboundedSender<SessionEvent>,
        mut events: UnboundedReceiver<SessionEvent>,
        observer: &mut O,
    ) -> Result<RunOutcome> {
        session.start_clock(sender);
        observer.render(&session);
        if session.state().is_terminal() {
            return Ok(RunOutcome::Finished(session));
        }

        while let Some(event) = events.recv().await {
            let submission = match event {
                SessionEvent::Tick => session.tick(),
                SessionEvent::Select(letter) => {
                    if let Err(e) = session.select_answer(letter) {
                        observer.notice(&e);
                    }
                    None
                }
                SessionEvent::Next => {
                    session.next();
                    None
                }
                SessionEvent::Prev => {
                    session.prev();
                    None
                }
                SessionEvent::Submit => match session.submit() {
                    Ok(submission) => submission,
                    Err(e) => {
                        observer.notice(&e);
                        None
                    }
                },
                SessionEvent::Retry => session.retry()?,
                SessionEvent::Abandon => {
                    session.abandon();
                    return Ok(RunOutcome::Abandoned);
                }
            };

            if let Some(submission) = submission {
                observer.render(&session);
                self.deliver(&mut session, submission).await?;
            }
            observer.render(&session);

            if session.state().is_terminal() {
                info!(session_id = %session.session_id(), state = session.state().name(), "Attempt finished");
                return Ok(RunOutcome::Finished(session));
            }
        }

        warn!(session_id = %session.session_id(), "Event channel closed, leaving attempt");
        session.abandon();
        Ok(RunOutcome::Abandoned)
    }
}
