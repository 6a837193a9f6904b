//! The assessment state machine
//!
//! `AssessmentEngine` is the single writer for session state. Every
//! mutation follows the same shape: run all upstream provider calls first,
//! then persist the whole step in one store transaction. A failed grade or
//! generation therefore leaves the session exactly where it was, and the
//! caller can retry the request verbatim.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::error::AssessmentError;
use super::policy::{ModePolicy, PRE_TURN_LIMIT};
use super::score::{aggregate, running_score};
use super::store::SessionStore;
use super::types::{
    AssessmentSession, Difficulty, Mode, PersonalizedOptions, Question, QuestionFormat, Scenario,
    SessionId, SessionStatus, Turn, now_unix,
};
use crate::profile::{ProfileStore, ProfileUpdater};
use crate::providers::{
    FeedbackRequest, FeedbackSynthesizer, FeedbackTurn, GradeRequest, PersonalizedFeedback,
    PriorTurn, QuestionRequest, QuestionSource, Scorer,
};

/// What a client sees after any engine call
///
/// Tagged by lifecycle state. The correct answer of a multiple-choice
/// question is stripped before it reaches this view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionView {
    /// Pre-assessment waiting for the binary familiarity answer
    Familiarity {
        session_id: SessionId,
        topic: String,
        prompt: String,
    },
    /// A question is pending an answer
    Question {
        session_id: SessionId,
        scenario: String,
        question: String,
        format: QuestionFormat,
        options: Vec<String>,
        hint: String,
        difficulty: Difficulty,
        /// 1-based position of this question
        question_number: u32,
        total_questions: u32,
        /// Rounded mean over the turns graded so far
        running_score: Option<u8>,
        /// Feedback for the answer just graded, if this view follows one
        previous_feedback: Option<String>,
        previous_score: Option<u8>,
    },
    /// The session has finished and is immutable
    Completed {
        session_id: SessionId,
        final_score: u8,
        /// Synthesized feedback, post-assessments only
        feedback: Option<PersonalizedFeedback>,
        /// Feedback for the last graded answer
        last_feedback: Option<String>,
    },
}

/// Completion summary for one (user, scenario, mode) triple
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssessmentStatus {
    pub completed: bool,
    pub score: Option<u8>,
}

/// Orchestrates assessment sessions end to end
pub struct AssessmentEngine<S> {
    store: Arc<S>,
    questions: Arc<dyn QuestionSource>,
    scorer: Arc<dyn Scorer>,
    synthesizer: Arc<dyn FeedbackSynthesizer>,
    updater: ProfileUpdater<S>,
    /// Per-session locks so concurrent submits for one session serialize
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl<S: SessionStore + ProfileStore> AssessmentEngine<S> {
    pub fn new(
        store: Arc<S>,
        questions: Arc<dyn QuestionSource>,
        scorer: Arc<dyn Scorer>,
        synthesizer: Arc<dyn FeedbackSynthesizer>,
    ) -> Self {
        Self {
            updater: ProfileUpdater::new(store.clone()),
            store,
            questions,
            scorer,
            synthesizer,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Start an assessment, or resume the existing one for this
    /// (user, scenario, mode) triple.
    ///
    /// Resuming replays the pending question rather than generating a new
    /// one, so a dropped response costs nothing. Starting a completed
    /// session returns the completed view unchanged.
    pub async fn start(
        &self,
        user_id: &str,
        scenario_id: &str,
        mode: Mode,
        options: Option<PersonalizedOptions>,
    ) -> Result<SessionView, AssessmentError> {
        let scenario = self
            .store
            .get_scenario(scenario_id)?
            .ok_or_else(|| AssessmentError::ScenarioNotFound(scenario_id.to_string()))?;

        if let Some(existing) = self.store.find_session(user_id, scenario_id, mode)? {
            tracing::debug!(session_id = %existing.id, %mode, "resuming session");
            return self.resume_view(&scenario, existing);
        }

        let started = match mode {
            Mode::Pre => self.start_pre(user_id, &scenario),
            Mode::Post => self.start_post(user_id, &scenario).await,
            Mode::Personalized => self.start_personalized(user_id, &scenario, options).await,
        };

        // Two simultaneous starts can both miss find_session; the loser's
        // insert trips the (user, scenario, mode) unique constraint and the
        // winner's session is resumed instead.
        match started {
            Err(AssessmentError::Database(db_err)) if is_unique_violation(&db_err) => {
                tracing::debug!(user_id, scenario_id, %mode, "start lost an insert race, resuming");
                let existing = self
                    .store
                    .find_session(user_id, scenario_id, mode)?
                    .ok_or(AssessmentError::Database(db_err))?;
                self.resume_view(&scenario, existing)
            }
            other => other,
        }
    }

    fn start_pre(&self, user_id: &str, scenario: &Scenario) -> Result<SessionView, AssessmentError> {
        let mut session = AssessmentSession::new(user_id, scenario, Mode::Pre);
        session.status = SessionStatus::AwaitingFamiliarity;
        session.turn_index = 0;
        session.turn_limit = PRE_TURN_LIMIT;
        session.difficulty = ModePolicy::initial_difficulty(Mode::Pre, None);
        self.store.insert_session(&session)?;

        tracing::info!(session_id = %session.id, user_id, scenario = %scenario.id, "pre-assessment started");
        Ok(familiarity_view(&session, scenario))
    }

    async fn start_post(
        &self,
        user_id: &str,
        scenario: &Scenario,
    ) -> Result<SessionView, AssessmentError> {
        let pre = self.store.find_session(user_id, &scenario.id, Mode::Pre)?;
        if !pre.is_some_and(|s| s.is_completed()) {
            return Err(AssessmentError::InvalidState(
                "post-assessment requires a completed pre-assessment".into(),
            ));
        }

        let mut session = AssessmentSession::new(user_id, scenario, Mode::Post);
        session.turn_limit = ModePolicy::post().turn_limit;
        session.difficulty = ModePolicy::initial_difficulty(Mode::Post, None);

        let question = self.generate_question(scenario, &session).await?;
        session.pending_question = Some(question);
        self.store.insert_session(&session)?;

        tracing::info!(session_id = %session.id, user_id, scenario = %scenario.id, "post-assessment started");
        Ok(question_view(&session, scenario, None))
    }

    async fn start_personalized(
        &self,
        user_id: &str,
        scenario: &Scenario,
        options: Option<PersonalizedOptions>,
    ) -> Result<SessionView, AssessmentError> {
        let options = options.ok_or_else(|| {
            AssessmentError::Validation("personalized assessments require options".into())
        })?;
        if options.question_count == 0 {
            return Err(AssessmentError::Validation(
                "question_count must be at least 1".into(),
            ));
        }

        let mut session = AssessmentSession::new(user_id, scenario, Mode::Personalized);
        session.turn_limit = options.question_count;
        session.difficulty = options.difficulty;
        session.format = options.format;

        let question = self.generate_question(scenario, &session).await?;
        session.pending_question = Some(question);
        self.store.insert_session(&session)?;

        tracing::info!(
            session_id = %session.id,
            user_id,
            scenario = %scenario.id,
            questions = options.question_count,
            "personalized assessment started"
        );
        Ok(question_view(&session, scenario, None))
    }

    fn resume_view(
        &self,
        scenario: &Scenario,
        session: AssessmentSession,
    ) -> Result<SessionView, AssessmentError> {
        match session.status {
            SessionStatus::Completed => Ok(completed_view(&session)),
            SessionStatus::AwaitingFamiliarity => Ok(familiarity_view(&session, scenario)),
            SessionStatus::InProgress => {
                if session.pending_question.is_none() {
                    return Err(AssessmentError::InvalidState(
                        "session in progress without a pending question".into(),
                    ));
                }
                let previous = session.turns.last().cloned();
                Ok(question_view(&session, scenario, previous.as_ref()))
            }
        }
    }

    /// Answer the familiarity question that gates a pre-assessment.
    ///
    /// "Familiar" starts at Normal difficulty, "not familiar" at Easy; the
    /// first graded question is generated here.
    pub async fn submit_familiarity(
        &self,
        session_id: &SessionId,
        familiar: bool,
    ) -> Result<SessionView, AssessmentError> {
        let lock = self.session_lock(*session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.familiarity_locked(session_id, familiar).await
        };
        drop(lock);
        self.prune_lock(*session_id).await;
        result
    }

    async fn familiarity_locked(
        &self,
        session_id: &SessionId,
        familiar: bool,
    ) -> Result<SessionView, AssessmentError> {
        let mut session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| AssessmentError::SessionNotFound(session_id.to_string()))?;
        if session.status != SessionStatus::AwaitingFamiliarity {
            return Err(AssessmentError::InvalidState(
                "session is not awaiting a familiarity answer".into(),
            ));
        }

        let scenario = self
            .store
            .get_scenario(&session.scenario_id)?
            .ok_or_else(|| AssessmentError::ScenarioNotFound(session.scenario_id.clone()))?;

        session.difficulty = if familiar {
            Difficulty::Normal
        } else {
            Difficulty::Easy
        };
        session.status = SessionStatus::InProgress;
        session.turn_index = 1;

        let question = self.generate_question(&scenario, &session).await?;
        session.pending_question = Some(question);
        self.store.advance_session(&session, None)?;

        tracing::debug!(session_id = %session.id, familiar, difficulty = %session.difficulty, "familiarity answered");
        Ok(question_view(&session, &scenario, None))
    }

    /// Grade an answer (or a skip) and advance the session.
    ///
    /// Grading, next-question generation, and feedback synthesis all happen
    /// before anything is written; the graded turn, updated difficulty, and
    /// next pending question then land in one transaction.
    pub async fn submit_answer(
        &self,
        session_id: &SessionId,
        answer: Option<&str>,
        skipped: bool,
    ) -> Result<SessionView, AssessmentError> {
        let lock = self.session_lock(*session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.answer_locked(session_id, answer, skipped).await
        };
        drop(lock);
        self.prune_lock(*session_id).await;
        result
    }

    async fn answer_locked(
        &self,
        session_id: &SessionId,
        answer: Option<&str>,
        skipped: bool,
    ) -> Result<SessionView, AssessmentError> {
        let mut session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| AssessmentError::SessionNotFound(session_id.to_string()))?;
        match session.status {
            SessionStatus::Completed => {
                return Err(AssessmentError::InvalidState(
                    "session is already completed".into(),
                ));
            }
            SessionStatus::AwaitingFamiliarity => {
                return Err(AssessmentError::InvalidState(
                    "familiarity answer required before submitting answers".into(),
                ));
            }
            SessionStatus::InProgress => {}
        }

        let question = session.pending_question.clone().ok_or_else(|| {
            AssessmentError::InvalidState("session has no pending question".into())
        })?;

        let answer_text = answer.unwrap_or_default().trim();
        if !skipped && answer_text.is_empty() {
            return Err(AssessmentError::Validation("answer must not be empty".into()));
        }

        let (score, feedback) = if skipped {
            (0, skip_feedback(&question))
        } else if question.format == QuestionFormat::MultipleChoice
            && question.correct_answer.is_some()
        {
            grade_choice(&question, answer_text)
        } else {
            let grade = self
                .scorer
                .grade(&GradeRequest {
                    scenario: question.prompt.clone(),
                    question: question.text.clone(),
                    answer: answer_text.to_string(),
                    skill: question.skill.clone(),
                })
                .await?;
            (grade.score.min(100), grade.feedback)
        };

        let turn = Turn {
            question,
            answer: (!skipped).then(|| answer_text.to_string()),
            skipped,
            score,
            feedback,
            answered_at: now_unix(),
        };
        session.turns.push(turn.clone());

        let policy = ModePolicy::for_mode(session.mode, session.turn_limit);
        session.difficulty = policy.next_difficulty(session.difficulty, score);
        session.pending_question = None;

        if policy.is_complete(&session.turns) {
            self.complete(&mut session, &turn).await
        } else {
            let scenario = self
                .store
                .get_scenario(&session.scenario_id)?
                .ok_or_else(|| AssessmentError::ScenarioNotFound(session.scenario_id.clone()))?;

            session.turn_index += 1;
            let next = self.generate_question(&scenario, &session).await?;
            session.pending_question = Some(next);
            self.store.advance_session(&session, Some(&turn))?;

            Ok(question_view(&session, &scenario, Some(&turn)))
        }
    }

    async fn complete(
        &self,
        session: &mut AssessmentSession,
        turn: &Turn,
    ) -> Result<SessionView, AssessmentError> {
        let final_score = aggregate(&session.turns);

        if session.mode == Mode::Post {
            let feedback = self
                .synthesizer
                .synthesize(&FeedbackRequest {
                    skill: session.skill.clone(),
                    final_score,
                    turns: session
                        .turns
                        .iter()
                        .map(|t| FeedbackTurn {
                            question: t.question.text.clone(),
                            answer: t.answer.clone().unwrap_or_default(),
                            score: t.score,
                        })
                        .collect(),
                })
                .await?;
            session.feedback = Some(feedback);
        }

        session.status = SessionStatus::Completed;
        session.final_score = Some(final_score);
        session.completed_at = Some(now_unix());
        self.store.advance_session(session, Some(turn))?;

        // Profile recomputation is best-effort; the completed session is
        // already durable and a later completion will recompute anyway.
        if let Err(err) = self
            .updater
            .on_session_completed(&session.user_id, final_score)
        {
            tracing::warn!(session_id = %session.id, error = %err, "profile update failed");
        }

        tracing::info!(
            session_id = %session.id,
            final_score,
            turns = session.turns.len(),
            "assessment completed"
        );
        Ok(SessionView::Completed {
            session_id: session.id,
            final_score,
            feedback: session.feedback.clone(),
            last_feedback: Some(turn.feedback.clone()),
        })
    }

    /// Completion summary without side effects
    pub fn status(
        &self,
        user_id: &str,
        scenario_id: &str,
        mode: Mode,
    ) -> Result<AssessmentStatus, AssessmentError> {
        let session = self.store.find_session(user_id, scenario_id, mode)?;
        Ok(match session {
            Some(s) if s.is_completed() => AssessmentStatus {
                completed: true,
                score: s.final_score,
            },
            _ => AssessmentStatus {
                completed: false,
                score: None,
            },
        })
    }

    /// Post-minus-pre score difference, once both have completed
    pub fn training_delta(
        &self,
        user_id: &str,
        scenario_id: &str,
    ) -> Result<Option<i16>, AssessmentError> {
        let pre = self.store.find_session(user_id, scenario_id, Mode::Pre)?;
        let post = self.store.find_session(user_id, scenario_id, Mode::Post)?;
        match (
            pre.and_then(|s| s.final_score),
            post.and_then(|s| s.final_score),
        ) {
            (Some(pre), Some(post)) => Ok(Some(post as i16 - pre as i16)),
            _ => Ok(None),
        }
    }

    async fn generate_question(
        &self,
        scenario: &Scenario,
        session: &AssessmentSession,
    ) -> Result<Question, AssessmentError> {
        let request = QuestionRequest {
            scenario_title: scenario.title.clone(),
            scenario_description: scenario.description.clone(),
            skill: scenario.skill.clone(),
            difficulty: session.difficulty,
            mode: session.mode,
            format: session.format,
            question_number: session.turn_index,
            prior: session
                .turns
                .iter()
                .map(|t| PriorTurn {
                    question: t.question.text.clone(),
                    answer: t.answer.clone().unwrap_or_default(),
                })
                .collect(),
        };
        Ok(self.questions.next_question(&request).await?)
    }

    async fn session_lock(&self, id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Drop the lock entry once nobody else holds or awaits it, so
    /// abandoned sessions do not accumulate entries for the process
    /// lifetime
    async fn prune_lock(&self, id: SessionId) {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(&id)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(&id);
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Grade a multiple-choice answer locally against the stored correct answer
fn grade_choice(question: &Question, answer: &str) -> (u8, String) {
    let correct = question.correct_answer.as_deref().unwrap_or_default();
    let matches = answer.eq_ignore_ascii_case(correct.trim())
        || answer.starts_with(correct.trim());
    if matches {
        (100, "Correct!".to_string())
    } else {
        (0, format!("Incorrect. The correct answer was: {correct}"))
    }
}

/// Feedback for a skipped question; shows the answer when one is known
fn skip_feedback(question: &Question) -> String {
    match &question.correct_answer {
        Some(correct) => format!("No problem! The correct answer is: {correct}"),
        None => format!(
            "That's okay. A strong answer would demonstrate {} in practice.",
            question.skill
        ),
    }
}

fn familiarity_view(session: &AssessmentSession, scenario: &Scenario) -> SessionView {
    SessionView::Familiarity {
        session_id: session.id,
        topic: scenario.title.clone(),
        prompt: format!("Are you familiar with {}?", scenario.title),
    }
}

fn question_view(
    session: &AssessmentSession,
    scenario: &Scenario,
    previous: Option<&Turn>,
) -> SessionView {
    // Callers guarantee a pending question exists for in-progress sessions
    let question = session
        .pending_question
        .clone()
        .unwrap_or_else(|| Question {
            prompt: String::new(),
            text: String::new(),
            format: session.format,
            options: vec![],
            correct_answer: None,
            hint: String::new(),
            skill: session.skill.clone(),
            difficulty: session.difficulty,
        });

    SessionView::Question {
        session_id: session.id,
        scenario: if question.prompt.is_empty() {
            scenario.description.clone()
        } else {
            question.prompt
        },
        question: question.text,
        format: question.format,
        options: question.options,
        hint: question.hint,
        difficulty: question.difficulty,
        question_number: session.turn_index,
        total_questions: session.turn_limit,
        running_score: running_score(&session.turns),
        previous_feedback: previous.map(|t| t.feedback.clone()),
        previous_score: previous.map(|t| t.score),
    }
}

fn completed_view(session: &AssessmentSession) -> SessionView {
    SessionView::Completed {
        session_id: session.id,
        final_score: session.final_score.unwrap_or_default(),
        feedback: session.feedback.clone(),
        last_feedback: session.turns.last().map(|t| t.feedback.clone()),
    }
}
