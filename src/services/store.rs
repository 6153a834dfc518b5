use crate::dto::authoring_dto::{QuestionDraft, QuizDraft};
use crate::dto::store_dto::{
    AttemptRecord, CreatedResource, QuestionRecord, SubmitAnswersPayload,
};
use crate::error::Result;
use crate::models::attempt::{AttemptHistoryEntry, AttemptResult};
use crate::models::question::Question;
use crate::models::quiz::Quiz;
use crate::services::credentials::Credentials;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Backend holding quizzes, questions and attempts.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait QuizStore {
    /// Every quiz visible to the caller.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>>;

    async fn fetch_quiz(&self, quiz_id: i64) -> Result<Quiz>;

    /// Questions of a quiz, in their stored order.
    async fn fetch_questions(&self, quiz_id: i64) -> Result<Vec<Question>>;

    async fn submit_answers(&self, quiz_id: i64, answers: Vec<String>) -> Result<AttemptResult>;

    /// Attempts made by the signed-in user.
    async fn fetch_my_attempts(&self) -> Result<Vec<AttemptHistoryEntry>>;

    /// Returns the id of the new quiz.
    async fn create_quiz(&self, draft: QuizDraft) -> Result<i64>;

    /// Returns the id of the new question.
    async fn add_question(&self, quiz_id: i64, question: QuestionDraft, order: u32) -> Result<i64>;
}

#[derive(Clone)]
pub struct HttpQuizStore {
    client: Client,
    base_url: Url,
    credentials: Arc<Credentials>,
}

impl HttpQuizStore {
    pub fn new(base_url: &str, credentials: Arc<Credentials>, timeout: Duration) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&normalized)?,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let response = response.error_for_status()?;
        tracing::debug!(status = %status, url = %response.url(), "Store responded");
        Ok(response.json::<T>().await?)
    }
}

impl QuizStore for HttpQuizStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>> {
        let url = self.endpoint("quizzes")?;
        self.send(self.client.get(url)).await
    }

    async fn fetch_quiz(&self, quiz_id: i64) -> Result<Quiz> {
        let url = self.endpoint(&format!("quizzes/{}", quiz_id))?;
        self.send(self.client.get(url)).await
    }

    async fn fetch_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let url = self.endpoint(&format!("quizzes/{}/questions", quiz_id))?;
        let records: Vec<QuestionRecord> = self.send(self.client.get(url)).await?;
        records.into_iter().map(Question::try_from).collect()
    }

    async fn submit_answers(&self, quiz_id: i64, answers: Vec<String>) -> Result<AttemptResult> {
        let url = self.endpoint(&format!("quizzes/{}/submit", quiz_id))?;
        let payload = SubmitAnswersPayload { answers };
        let record: AttemptRecord = self.send(self.client.post(url).json(&payload)).await?;
        Ok(record.into())
    }

    async fn fetch_my_attempts(&self) -> Result<Vec<AttemptHistoryEntry>> {
        let url = self.endpoint("quizzes/attempts")?;
        let records: Vec<AttemptRecord> = self.send(self.client.get(url)).await?;
        Ok(records.into_iter().map(AttemptHistoryEntry::from).collect())
    }

    async fn create_quiz(&self, draft: QuizDraft) -> Result<i64> {
        let url = self.endpoint("quizzes")?;
        let created: CreatedResource = self.send(self.client.post(url).json(&draft)).await?;
        Ok(created.id)
    }

    async fn add_question(&self, quiz_id: i64, question: QuestionDraft, order: u32) -> Result<i64> {
        let url = self.endpoint(&format!("quizzes/{}/questions", quiz_id))?;
        let record = QuestionRecord::from_draft(&question, order);
        let created: CreatedResource = self.send(self.client.post(url).json(&record)).await?;
        Ok(created.id)
    }
}
