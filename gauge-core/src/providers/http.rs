//! HTTP-backed provider client
//!
//! Talks to a generator service over JSON. Every call carries a bounded
//! timeout; a timed-out or failed call surfaces as a [`ProviderError`] and
//! the engine guarantees no session state was committed, so callers can
//! retry the identical request.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{
    FeedbackRequest, FeedbackSynthesizer, Grade, GradeRequest, PersonalizedFeedback,
    ProviderError, QuestionRequest, QuestionSource, Scorer,
};
use crate::assessment::Question;

/// Default bound on a single provider call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the HTTP provider
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Base URL of the generator service
    pub base_url: Url,
    pub timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Question source, scorer, and feedback synthesizer over one HTTP service
pub struct HttpProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Malformed(format!("bad endpoint {path}: {e}")))
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, ProviderError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "calling generator service");

        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.post(url).json(body).send(),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.config.timeout))?;

        let response = response?.error_for_status()?;
        let parsed = tokio::time::timeout(self.config.timeout, response.json::<Resp>())
            .await
            .map_err(|_| ProviderError::Timeout(self.config.timeout))??;
        Ok(parsed)
    }
}

#[async_trait]
impl QuestionSource for HttpProvider {
    async fn next_question(&self, request: &QuestionRequest) -> Result<Question, ProviderError> {
        let mut question: Question = self.post("question", request).await?;
        if question.text.trim().is_empty() {
            return Err(ProviderError::Malformed("empty question text".into()));
        }
        // The requested difficulty is authoritative for session state
        question.difficulty = request.difficulty;
        Ok(question)
    }
}

#[async_trait]
impl Scorer for HttpProvider {
    async fn grade(&self, request: &GradeRequest) -> Result<Grade, ProviderError> {
        let mut grade: Grade = self.post("grade", request).await?;
        grade.score = grade.score.min(100);
        Ok(grade)
    }
}

#[async_trait]
impl FeedbackSynthesizer for HttpProvider {
    async fn synthesize(
        &self,
        request: &FeedbackRequest,
    ) -> Result<PersonalizedFeedback, ProviderError> {
        self.post("feedback", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_applies_default_timeout() {
        let config = HttpProviderConfig::new(Url::parse("http://localhost:9800/").unwrap());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn endpoint_joins_relative_paths() {
        let config = HttpProviderConfig::new(Url::parse("http://localhost:9800/api/").unwrap());
        let provider = HttpProvider::new(config).unwrap();
        let url = provider.endpoint("question").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9800/api/question");
    }
}
