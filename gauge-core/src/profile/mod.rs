//! Per-user skill profiles and rating
//!
//! Derived, recomputed state: every time a session completes the whole
//! profile is rebuilt from the historical record. Never hand-edited.

mod updater;

pub use updater::{ProfileUpdater, UNCLASSIFIED_SKILL};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assessment::AssessmentError;

/// Mapping from skill name to the rounded mean of completed-session scores.
/// Skills with zero sessions are omitted, not zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillProfile {
    pub skills: BTreeMap<String, u8>,
}

/// ELO-like rating plus accumulated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub elo: i32,
    pub points: u32,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            elo: 1000,
            points: 0,
        }
    }
}

impl Rating {
    /// Apply one completed-session score.
    ///
    /// Always a positive adjustment, small for weak runs: 0 gives +2,
    /// 100 gives +22. Points jump for scores above 70.
    pub fn apply(&mut self, score: u8) {
        self.elo += (score as f64 * 0.2).round() as i32 + 2;
        self.points += if score > 70 { 100 } else { 10 };
    }
}

/// Storage for derived profile state
pub trait ProfileStore: Send + Sync {
    /// All completed-session (skill, score) pairs for a user, oldest first
    fn completed_scores(&self, user_id: &str) -> Result<Vec<(String, u8)>, AssessmentError>;

    /// Current profile and rating; defaults for unknown users
    fn get_profile(&self, user_id: &str) -> Result<(SkillProfile, Rating), AssessmentError>;

    /// Full overwrite of the stored profile and rating
    fn save_profile(
        &self,
        user_id: &str,
        profile: &SkillProfile,
        rating: &Rating,
    ) -> Result<(), AssessmentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_adjustment_is_always_positive() {
        let mut rating = Rating::default();
        rating.apply(0);
        assert_eq!(rating.elo, 1002);
        assert_eq!(rating.points, 10);

        let mut rating = Rating::default();
        rating.apply(100);
        assert_eq!(rating.elo, 1022);
        assert_eq!(rating.points, 100);
    }

    #[test]
    fn points_threshold_is_strictly_above_seventy() {
        let mut rating = Rating::default();
        rating.apply(70);
        assert_eq!(rating.points, 10);
        rating.apply(71);
        assert_eq!(rating.points, 110);
    }

    #[test]
    fn skill_profile_serializes_as_plain_map() {
        let mut profile = SkillProfile::default();
        profile.skills.insert("Security".into(), 72);
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, "{\"Security\":72}");
    }
}
