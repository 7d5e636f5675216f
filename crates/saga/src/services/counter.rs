//! Article bookmark-counter client trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::ArticleId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the counter service.
#[derive(Debug, Clone, Error)]
pub enum CounterError {
    /// The call could not be completed (transport failure, timeout, 5xx).
    #[error("Counter service unavailable: {0}")]
    Unavailable(String),

    /// The article does not exist in the Article service.
    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    /// The Article service answered but refused the mutation.
    #[error("Counter update rejected: {0}")]
    Rejected(String),
}

/// The four counter mutations exposed by the Article service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOperation {
    Increment,
    Decrement,
    /// Undoes a committed `Decrement`.
    IncrementCompensate,
    /// Undoes a committed `Increment`.
    DecrementCompensate,
}

impl CounterOperation {
    /// Returns the operation name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterOperation::Increment => "increment",
            CounterOperation::Decrement => "decrement",
            CounterOperation::IncrementCompensate => "increment_compensate",
            CounterOperation::DecrementCompensate => "decrement_compensate",
        }
    }

    /// Returns the change this operation applies to the counter.
    pub fn delta(&self) -> i64 {
        match self {
            CounterOperation::Increment | CounterOperation::IncrementCompensate => 1,
            CounterOperation::Decrement | CounterOperation::DecrementCompensate => -1,
        }
    }
}

impl std::fmt::Display for CounterOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for the Article service's denormalized bookmark counter.
///
/// The counter is owned by the Article service and only ever changed through
/// these calls.
#[async_trait]
pub trait CounterService: Send + Sync {
    /// Adds one to the article's bookmark count.
    async fn increment_count(&self, article_id: ArticleId) -> Result<(), CounterError>;

    /// Subtracts one from the article's bookmark count.
    async fn decrement_count(&self, article_id: ArticleId) -> Result<(), CounterError>;

    /// Compensates a committed `decrement_count`.
    async fn increment_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError>;

    /// Compensates a committed `increment_count`.
    async fn decrement_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError>;

    /// Dispatches one of the four operations.
    async fn apply(
        &self,
        operation: CounterOperation,
        article_id: ArticleId,
    ) -> Result<(), CounterError> {
        match operation {
            CounterOperation::Increment => self.increment_count(article_id).await,
            CounterOperation::Decrement => self.decrement_count(article_id).await,
            CounterOperation::IncrementCompensate => {
                self.increment_count_compensate(article_id).await
            }
            CounterOperation::DecrementCompensate => {
                self.decrement_count_compensate(article_id).await
            }
        }
    }
}

#[async_trait]
impl<C: CounterService + ?Sized> CounterService for Arc<C> {
    async fn increment_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        (**self).increment_count(article_id).await
    }

    async fn decrement_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        (**self).decrement_count(article_id).await
    }

    async fn increment_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        (**self).increment_count_compensate(article_id).await
    }

    async fn decrement_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        (**self).decrement_count_compensate(article_id).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCounterState {
    counts: HashMap<ArticleId, i64>,
    calls: Vec<(CounterOperation, ArticleId)>,
    failing: HashSet<CounterOperation>,
    missing_articles: HashSet<ArticleId>,
}

/// In-memory counter service for testing and local runs.
///
/// Every attempted call is recorded, including the ones configured to fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterService {
    state: Arc<Mutex<InMemoryCounterState>>,
}

impl InMemoryCounterService {
    /// Creates a new in-memory counter service.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryCounterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures an operation to fail with `Unavailable`.
    pub fn set_fail_on(&self, operation: CounterOperation, fail: bool) {
        let mut state = self.lock();
        if fail {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Makes every operation on the article fail with `ArticleNotFound`.
    pub fn remove_article(&self, article_id: ArticleId) {
        self.lock().missing_articles.insert(article_id);
    }

    /// Returns the current bookmark count of an article.
    pub fn count(&self, article_id: ArticleId) -> i64 {
        self.lock().counts.get(&article_id).copied().unwrap_or(0)
    }

    /// Returns every attempted call, in order.
    pub fn calls(&self) -> Vec<(CounterOperation, ArticleId)> {
        self.lock().calls.clone()
    }

    /// Returns how many times an operation was attempted.
    pub fn call_count(&self, operation: CounterOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    fn mutate(&self, operation: CounterOperation, article_id: ArticleId) -> Result<(), CounterError> {
        let mut state = self.lock();
        state.calls.push((operation, article_id));

        if state.missing_articles.contains(&article_id) {
            return Err(CounterError::ArticleNotFound(article_id));
        }
        if state.failing.contains(&operation) {
            return Err(CounterError::Unavailable(format!(
                "{operation} unavailable"
            )));
        }

        *state.counts.entry(article_id).or_insert(0) += operation.delta();
        Ok(())
    }
}

#[async_trait]
impl CounterService for InMemoryCounterService {
    async fn increment_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.mutate(CounterOperation::Increment, article_id)
    }

    async fn decrement_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.mutate(CounterOperation::Decrement, article_id)
    }

    async fn increment_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.mutate(CounterOperation::IncrementCompensate, article_id)
    }

    async fn decrement_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.mutate(CounterOperation::DecrementCompensate, article_id)
    }
}
