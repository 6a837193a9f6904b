//! Per-mode assessment policy
//!
//! Mode-specific behavior (turn limit, familiarity gate, difficulty
//! adaptation, early settlement) is resolved into a `ModePolicy` once at
//! start time instead of being re-branched on every call.

use super::types::{Difficulty, Mode, PersonalizedOptions, Turn};
use crate::assessment::score::mean_score;

/// Score at or above which difficulty escalates one step
pub const ESCALATE_AT: u8 = 70;
/// Score below which difficulty de-escalates one step
pub const DE_ESCALATE_BELOW: u8 = 40;

/// Maximum turns for a pre-assessment
pub const PRE_TURN_LIMIT: u32 = 4;
/// Minimum turns before a pre-assessment may settle early
pub const PRE_MIN_TURNS: u32 = 2;
/// Pre-assessment settles early once the running mean leaves this band
pub const PRE_SETTLE_LOW: f64 = 30.0;
pub const PRE_SETTLE_HIGH: f64 = 80.0;

/// Fixed turn count for a post-assessment
pub const POST_TURN_COUNT: u32 = 7;

/// Early-settlement rule: stop once the running mean is decisive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlySettle {
    pub min_turns: u32,
    pub low: f64,
    pub high: f64,
}

/// Resolved behavior for one session's mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModePolicy {
    pub turn_limit: u32,
    /// Whether the session begins with the binary familiarity question
    pub familiarity_gate: bool,
    /// Whether difficulty moves turn-to-turn with the hill-climbing ladder
    pub adapts_difficulty: bool,
    pub early_settle: Option<EarlySettle>,
}

impl ModePolicy {
    pub fn pre() -> Self {
        Self {
            turn_limit: PRE_TURN_LIMIT,
            familiarity_gate: true,
            adapts_difficulty: true,
            early_settle: Some(EarlySettle {
                min_turns: PRE_MIN_TURNS,
                low: PRE_SETTLE_LOW,
                high: PRE_SETTLE_HIGH,
            }),
        }
    }

    pub fn post() -> Self {
        Self {
            turn_limit: POST_TURN_COUNT,
            familiarity_gate: false,
            adapts_difficulty: true,
            early_settle: None,
        }
    }

    /// Personalized sessions hold difficulty fixed for the whole run
    pub fn personalized(options: &PersonalizedOptions) -> Self {
        Self {
            turn_limit: options.question_count,
            familiarity_gate: false,
            adapts_difficulty: false,
            early_settle: None,
        }
    }

    /// Resolve the policy for a session. Personalized sessions read the
    /// turn limit back from the session row, so only the mode is needed.
    pub fn for_mode(mode: Mode, turn_limit: u32) -> Self {
        match mode {
            Mode::Pre => Self::pre(),
            Mode::Post => Self::post(),
            Mode::Personalized => Self {
                turn_limit,
                familiarity_gate: false,
                adapts_difficulty: false,
                early_settle: None,
            },
        }
    }

    /// Initial difficulty for modes without a familiarity gate
    pub fn initial_difficulty(mode: Mode, options: Option<&PersonalizedOptions>) -> Difficulty {
        match mode {
            // Set later by the familiarity answer; Easy until then
            Mode::Pre => Difficulty::Easy,
            Mode::Post => Difficulty::Normal,
            Mode::Personalized => options.map(|o| o.difficulty).unwrap_or_default(),
        }
    }

    /// Apply the adaptation ladder, or hold if this mode keeps difficulty fixed
    pub fn next_difficulty(&self, current: Difficulty, score: u8) -> Difficulty {
        if self.adapts_difficulty {
            current.adjusted_for(score)
        } else {
            current
        }
    }

    /// Termination check, evaluated after a turn has been graded
    pub fn is_complete(&self, turns: &[Turn]) -> bool {
        let count = turns.len() as u32;
        if count >= self.turn_limit {
            return true;
        }
        if let Some(settle) = self.early_settle
            && count >= settle.min_turns
        {
            let mean = mean_score(turns);
            return mean < settle.low || mean > settle.high;
        }
        false
    }
}
