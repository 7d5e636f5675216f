//! HTTP client for the Article service's bookmark counter.

use std::time::Duration;

use async_trait::async_trait;
use common::ArticleId;
use saga::{CounterError, CounterOperation, CounterService};
use serde::{Deserialize, Serialize};

/// Body returned by every counter endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CounterResponse {
    pub success: bool,
}

/// `CounterService` backed by the Article service's HTTP API.
///
/// Each operation is `POST {base_url}/articles/{article_id}/{operation}`.
/// Dropping the returned future aborts the in-flight request.
#[derive(Debug, Clone)]
pub struct HttpCounterClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCounterClient {
    /// Creates a client whose calls time out after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, operation: CounterOperation, article_id: ArticleId) -> String {
        format!("{}/articles/{}/{}", self.base_url, article_id, operation)
    }

    #[tracing::instrument(skip(self), level = "debug", fields(%article_id))]
    async fn call(
        &self,
        operation: CounterOperation,
        article_id: ArticleId,
    ) -> Result<(), CounterError> {
        let start = std::time::Instant::now();
        let result = self.send(operation, article_id).await;

        metrics::histogram!("counter_request_duration_seconds", "operation" => operation.as_str())
            .record(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::counter!("counter_request_failures_total", "operation" => operation.as_str())
                .increment(1);
            tracing::warn!(%operation, error = %e, "counter call failed");
        }
        result
    }

    async fn send(
        &self,
        operation: CounterOperation,
        article_id: ArticleId,
    ) -> Result<(), CounterError> {
        let response = self
            .client
            .post(self.url(operation, article_id))
            .send()
            .await
            .map_err(|e| CounterError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CounterError::ArticleNotFound(article_id));
        }
        if status.is_server_error() {
            return Err(CounterError::Unavailable(format!("{operation} returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CounterError::Rejected(format!("{operation} returned {status}: {body}")));
        }

        let body: CounterResponse = response
            .json()
            .await
            .map_err(|e| CounterError::Unavailable(e.to_string()))?;
        if !body.success {
            return Err(CounterError::Rejected(format!("{operation} reported failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterService for HttpCounterClient {
    async fn increment_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.call(CounterOperation::Increment, article_id).await
    }

    async fn decrement_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.call(CounterOperation::Decrement, article_id).await
    }

    async fn increment_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.call(CounterOperation::IncrementCompensate, article_id).await
    }

    async fn decrement_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.call(CounterOperation::DecrementCompensate, article_id).await
    }
}
