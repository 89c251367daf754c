// ==================== RECOMMENDATION ENGINE ====================
// The engine is an opaque HTTP endpoint: `GET <endpoint>?user_id=<uid>` reads
// the user's profile, computes a course list and stores it under
// `recommendations/<uid>`. Only the status code matters here; the list is
// read back from the document store by the browsing views.

use async_trait::async_trait;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("recommendation engine returned {0}")]
    Status(StatusCode),

    #[error("recommendation engine unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait RecommendationEngine: Send + Sync {
    /// Asks the engine to (re)generate the course list for `uid`.
    async fn generate(&self, uid: &str) -> Result<(), RecommendationError>;
}

pub struct HttpRecommendationEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecommendationEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RecommendationEngine for HttpRecommendationEngine {
    async fn generate(&self, uid: &str) -> Result<(), RecommendationError> {
        log::info!("Requesting recommendations for user {}", uid);

        // No timeout: a cold engine can take minutes to answer.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("user_id", uid)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendationError::Status(status));
        }

        log::info!("✅ Recommendations generated for user {}", uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_generate_sends_user_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/recommend").query_param("user_id", "uid-1");
                then.status(200).body("[]");
            })
            .await;

        let engine = HttpRecommendationEngine::new(server.url("/recommend"));
        engine.generate("uid-1").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/recommend");
                then.status(404).body(r#"{"error": "User not found"}"#);
            })
            .await;

        let engine = HttpRecommendationEngine::new(server.url("/recommend"));
        let err = engine.generate("missing").await.unwrap_err();
        assert!(matches!(err, RecommendationError::Status(StatusCode::NOT_FOUND)));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP.
        let engine = HttpRecommendationEngine::new("http://127.0.0.1:9/recommend");
        let err = engine.generate("u1").await.unwrap_err();
        assert!(matches!(err, RecommendationError::Transport(_)));
    }
}
