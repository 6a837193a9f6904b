//! gauge-core: Core library for the gauge adaptive assessment engine
//!
//! This crate implements the stateful protocol that drives a user through a
//! multi-turn knowledge evaluation:
//!
//! - **Assessment engine** - [`AssessmentEngine`] orchestrates familiarity
//!   gating, turn sequencing, difficulty adaptation, and completion
//! - **Session store** - [`SessionStore`] trait with a SQLite implementation
//!   as the sole durable holder of session state
//! - **Providers** - [`QuestionSource`], [`Scorer`], and
//!   [`FeedbackSynthesizer`] seams for the generative backend
//! - **Skill profiles** - [`ProfileUpdater`] recomputes per-skill means and
//!   an ELO-like rating whenever a session completes
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gauge_core::{
//!     AssessmentEngine, Mode, Scenario, ScriptedProvider, SessionStore, SqliteSessionStore,
//! };
//!
//! # async fn example() -> Result<(), gauge_core::AssessmentError> {
//! let store = Arc::new(SqliteSessionStore::open_in_memory()?);
//! store.put_scenario(&Scenario::new("s-1", "Incident Response", "Security"))?;
//!
//! let provider = Arc::new(ScriptedProvider::new());
//! let engine = AssessmentEngine::new(store, provider.clone(), provider.clone(), provider);
//!
//! let view = engine.start("u-1", "s-1", Mode::Pre, None).await?;
//! println!("{:?}", view);
//! # Ok(())
//! # }
//! ```

pub mod assessment;
pub mod profile;
pub mod providers;

// Re-export key types for convenience
pub use assessment::{
    AssessmentEngine, AssessmentError, AssessmentSession, AssessmentStatus, Difficulty, Mode,
    ModePolicy, PersonalizedOptions, Question, QuestionFormat, Scenario, SessionId, SessionStatus,
    SessionStore, SessionView, SqliteSessionStore, Turn,
};
pub use profile::{ProfileStore, ProfileUpdater, Rating, SkillProfile, UNCLASSIFIED_SKILL};
pub use providers::{
    FeedbackRequest, FeedbackSynthesizer, Grade, GradeRequest, HttpProvider, HttpProviderConfig,
    PersonalizedFeedback, PriorTurn, ProviderError, QuestionRequest, QuestionSource,
    ScriptedProvider, Scorer,
};
