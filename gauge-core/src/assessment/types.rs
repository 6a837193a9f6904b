//! Core assessment types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::providers::PersonalizedFeedback;

/// Unique identifier for an assessment session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new session ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from a string representation
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assessment mode
///
/// Determines the turn limit, the familiarity gate, and whether difficulty
/// adapts turn-to-turn. Selected once at `start` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Baseline check before training, gated on a familiarity question
    Pre,
    /// Outcome check after training, fixed at seven turns
    Post,
    /// Free-form user-directed run with fixed difficulty and format
    Personalized,
}

impl Mode {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
            Self::Personalized => "personalized",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pre" => Some(Self::Pre),
            "post" => Some(Self::Post),
            "personalized" => Some(Self::Personalized),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Question difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// One step harder, capping at Hard
    pub fn escalate(self) -> Self {
        match self {
            Self::Easy => Self::Normal,
            Self::Normal | Self::Hard => Self::Hard,
        }
    }

    /// One step easier, capping at Easy
    pub fn de_escalate(self) -> Self {
        match self {
            Self::Hard => Self::Normal,
            Self::Normal | Self::Easy => Self::Easy,
        }
    }

    /// Hill-climbing adaptation: strong answers escalate, weak answers
    /// de-escalate, middling answers hold
    pub fn adjusted_for(self, score: u8) -> Self {
        if score >= crate::assessment::policy::ESCALATE_AT {
            self.escalate()
        } else if score < crate::assessment::policy::DE_ESCALATE_BELOW {
            self.de_escalate()
        } else {
            self
        }
    }

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Question presentation format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    #[default]
    Text,
    MultipleChoice,
}

impl QuestionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultipleChoice => "multiple_choice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "multiple_choice" => Some(Self::MultipleChoice),
            _ => None,
        }
    }
}

/// A generated question as returned by the question source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Brief workplace situation the question is embedded in
    pub prompt: String,
    /// The question itself
    pub text: String,
    pub format: QuestionFormat,
    /// Choices for multiple-choice questions, empty for free text
    #[serde(default)]
    pub options: Vec<String>,
    /// Expected answer, used for local multiple-choice grading.
    /// Never exposed to clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub hint: String,
    /// Target skill being probed
    pub skill: String,
    pub difficulty: Difficulty,
}

/// One graded question/answer pair within a session
///
/// Created when the engine grades an answer; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub question: Question,
    /// Submitted answer text, `None` when the question was skipped
    pub answer: Option<String>,
    pub skipped: bool,
    /// Graded score, 0-100 (skipped turns score 0)
    pub score: u8,
    pub feedback: String,
    /// Unix timestamp (seconds)
    pub answered_at: i64,
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Pre-assessment only: waiting for the binary familiarity answer
    AwaitingFamiliarity,
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingFamiliarity => "awaiting_familiarity",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_familiarity" => Some(Self::AwaitingFamiliarity),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// User-selected settings for a personalized session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedOptions {
    pub difficulty: Difficulty,
    pub format: QuestionFormat,
    /// Total number of questions for the session
    pub question_count: u32,
}

/// A training scenario the engine can assess against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    /// Skill tag used for grouping in the skill profile
    pub skill: String,
    #[serde(default)]
    pub description: String,
}

impl Scenario {
    pub fn new(id: impl Into<String>, title: impl Into<String>, skill: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            skill: skill.into(),
            description: String::new(),
        }
    }
}

/// One evaluation run for a (user, scenario, mode) triple
///
/// The engine is the only writer; the session store is the sole durable
/// holder. Once completed, the session is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: SessionId,
    pub user_id: String,
    pub scenario_id: String,
    /// Skill tag copied from the scenario at start
    pub skill: String,
    pub mode: Mode,
    pub status: SessionStatus,
    /// 1-based current question number; 0 while awaiting familiarity
    pub turn_index: u32,
    pub turn_limit: u32,
    pub difficulty: Difficulty,
    pub format: QuestionFormat,
    /// Graded turns in evaluation order (append-only)
    pub turns: Vec<Turn>,
    /// The generated-but-unanswered question, present iff in progress.
    /// Persisted so a resumed `start` replays it instead of generating anew.
    pub pending_question: Option<Question>,
    /// Set iff status is Completed
    pub final_score: Option<u8>,
    /// Synthesized personalized feedback (post mode only)
    pub feedback: Option<PersonalizedFeedback>,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

impl AssessmentSession {
    /// Create a fresh session with timestamps set to now
    pub fn new(user_id: &str, scenario: &Scenario, mode: Mode) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.to_string(),
            scenario_id: scenario.id.clone(),
            skill: scenario.skill.clone(),
            mode,
            status: SessionStatus::InProgress,
            turn_index: 1,
            turn_limit: 0,
            difficulty: Difficulty::Normal,
            format: QuestionFormat::Text,
            turns: Vec::new(),
            pending_question: None,
            final_score: None,
            feedback: None,
            created_at: now_unix(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Current unix time in seconds
pub(crate) fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
