//! Provider seams for the generative backend
//!
//! The engine consumes three capabilities: a question source, a scorer, and
//! a feedback synthesizer. They are traits so the generative backend stays
//! an opaque collaborator; [`HttpProvider`] talks to a real generator
//! service and [`ScriptedProvider`] is a deterministic offline stand-in.

mod http;
mod scripted;

pub use http::{HttpProvider, HttpProviderConfig};
pub use scripted::ScriptedProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::assessment::{Difficulty, Mode, Question, QuestionFormat};

/// Errors from question/scoring providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// A prior question/answer pair, passed so the source can avoid repeats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorTurn {
    pub question: String,
    pub answer: String,
}

/// Context for generating the next question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub scenario_title: String,
    pub scenario_description: String,
    pub skill: String,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub format: QuestionFormat,
    /// 1-based number of the question being generated
    pub question_number: u32,
    pub prior: Vec<PriorTurn>,
}

/// Context for grading a free-text answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    pub scenario: String,
    pub question: String,
    pub answer: String,
    pub skill: String,
}

/// A graded answer: numeric score plus short feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    /// 0-100; providers returning out-of-range values are clamped
    pub score: u8,
    pub feedback: String,
}

/// A completed turn as seen by the feedback synthesizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackTurn {
    pub question: String,
    pub answer: String,
    pub score: u8,
}

/// Full turn history for personalized feedback synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub skill: String,
    pub final_score: u8,
    pub turns: Vec<FeedbackTurn>,
}

/// Synthesized end-of-assessment feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedFeedback {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Produces the next question for a session
///
/// Implementations must avoid repeating an identical question text within
/// one session; the engine passes `prior` for that purpose but does not
/// enforce it.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn next_question(&self, request: &QuestionRequest) -> Result<Question, ProviderError>;
}

/// Grades a free-text answer against a question
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn grade(&self, request: &GradeRequest) -> Result<Grade, ProviderError>;
}

/// Synthesizes personalized feedback over a full turn history
#[async_trait]
pub trait FeedbackSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        request: &FeedbackRequest,
    ) -> Result<PersonalizedFeedback, ProviderError>;
}
