//! Adaptive assessment protocol with SQLite-backed session storage

mod engine;
mod error;
mod migrations;
mod policy;
mod score;
mod store;
mod types;

pub use engine::{AssessmentEngine, AssessmentStatus, SessionView};
pub use error::AssessmentError;
pub use policy::{EarlySettle, ModePolicy};
pub use score::{aggregate, mean_score, running_score};
pub use store::{SessionStore, SqliteSessionStore};
pub use types::{
    AssessmentSession, Difficulty, Mode, PersonalizedOptions, Question, QuestionFormat, Scenario,
    SessionId, SessionStatus, Turn,
};
