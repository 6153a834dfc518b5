use crate::error::Result;
use crate::models::attempt::{AttemptHistoryEntry, AttemptStats};
use crate::models::quiz::{Quiz, QuizFilter};
use crate::services::store::QuizStore;
use tracing::info;

/// Read-only views over the store: the quiz list and the caller's history.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: QuizStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn browse(&self, filter: &QuizFilter) -> Result<Vec<Quiz>> {
        let quizzes = self.store.list_quizzes().await?;
        let matched: Vec<Quiz> = filter.apply(&quizzes).into_iter().cloned().collect();
        info!(total = quizzes.len(), matched = matched.len(), "Quizzes listed");
        Ok(matched)
    }

    pub async fn history(&self) -> Result<(Vec<AttemptHistoryEntry>, AttemptStats)> {
        let history = self.store.fetch_my_attempts().await?;
        let stats = AttemptStats::from_history(&history);
        info!(taken = stats.taken, average = stats.average_percentage, "Attempt history loaded");
        Ok((history, stats))
    }
}
