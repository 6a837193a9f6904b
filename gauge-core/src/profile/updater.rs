//! Skill profile recomputation

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ProfileStore, Rating, SkillProfile};
use crate::assessment::AssessmentError;

/// Sessions tagged with this skill are excluded from the profile
pub const UNCLASSIFIED_SKILL: &str = "General";

/// Recomputes a user's skill profile and rating on session completion.
///
/// Full recompute rather than incremental update: O(n) over the user's
/// historical sessions, self-healing against missed updates.
pub struct ProfileUpdater<S> {
    store: Arc<S>,
}

impl<S: ProfileStore> ProfileUpdater<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rebuild the profile from every completed session and fold the
    /// just-completed score into the rating.
    pub fn on_session_completed(
        &self,
        user_id: &str,
        final_score: u8,
    ) -> Result<(SkillProfile, Rating), AssessmentError> {
        let scores = self.store.completed_scores(user_id)?;
        let profile = recompute(&scores);

        let (_, mut rating) = self.store.get_profile(user_id)?;
        rating.apply(final_score);

        self.store.save_profile(user_id, &profile, &rating)?;
        tracing::debug!(
            user_id,
            skills = profile.skills.len(),
            elo = rating.elo,
            "skill profile recomputed"
        );
        Ok((profile, rating))
    }
}

/// Group scores by skill and take the rounded mean, skipping unclassified
fn recompute(scores: &[(String, u8)]) -> SkillProfile {
    let mut grouped: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
    for (skill, score) in scores {
        if skill == UNCLASSIFIED_SKILL {
            continue;
        }
        grouped.entry(skill).or_default().push(*score);
    }

    let skills = grouped
        .into_iter()
        .map(|(skill, scores)| {
            let sum: u32 = scores.iter().map(|&s| s as u32).sum();
            let mean = (sum as f64 / scores.len() as f64).round() as u8;
            (skill.to_string(), mean)
        })
        .collect();

    SkillProfile { skills }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeProfileStore {
        scores: Vec<(String, u8)>,
        saved: Mutex<Option<(SkillProfile, Rating)>>,
    }

    impl ProfileStore for FakeProfileStore {
        fn completed_scores(&self, _user_id: &str) -> Result<Vec<(String, u8)>, AssessmentError> {
            Ok(self.scores.clone())
        }

        fn get_profile(&self, _user_id: &str) -> Result<(SkillProfile, Rating), AssessmentError> {
            Ok(self
                .saved
                .lock()
                .unwrap()
                .clone()
                .unwrap_or((SkillProfile::default(), Rating::default())))
        }

        fn save_profile(
            &self,
            _user_id: &str,
            profile: &SkillProfile,
            rating: &Rating,
        ) -> Result<(), AssessmentError> {
            *self.saved.lock().unwrap() = Some((profile.clone(), *rating));
            Ok(())
        }
    }

    #[test]
    fn recompute_groups_by_skill() {
        let scores = vec![
            ("Security".to_string(), 80),
            ("Security".to_string(), 61),
            ("Support".to_string(), 50),
        ];
        let profile = recompute(&scores);
        // round((80 + 61) / 2) = round(70.5) = 71
        assert_eq!(profile.skills.get("Security"), Some(&71));
        assert_eq!(profile.skills.get("Support"), Some(&50));
    }

    #[test]
    fn recompute_excludes_unclassified() {
        let scores = vec![
            ("General".to_string(), 90),
            ("Security".to_string(), 40),
        ];
        let profile = recompute(&scores);
        assert!(!profile.skills.contains_key("General"));
        assert_eq!(profile.skills.len(), 1);
    }

    #[test]
    fn recompute_empty_is_empty() {
        assert!(recompute(&[]).skills.is_empty());
    }

    #[test]
    fn completion_saves_profile_and_rating() {
        let store = Arc::new(FakeProfileStore {
            scores: vec![("Security".to_string(), 80)],
            saved: Mutex::new(None),
        });
        let updater = ProfileUpdater::new(store.clone());

        let (profile, rating) = updater.on_session_completed("u-1", 80).unwrap();
        assert_eq!(profile.skills.get("Security"), Some(&80));
        assert_eq!(rating.elo, 1018); // 1000 + round(80 * 0.2) + 2
        assert_eq!(rating.points, 100);
        assert!(store.saved.lock().unwrap().is_some());
    }

    #[test]
    fn rating_accumulates_across_completions() {
        let store = Arc::new(FakeProfileStore {
            scores: vec![],
            saved: Mutex::new(None),
        });
        let updater = ProfileUpdater::new(store);

        updater.on_session_completed("u-1", 80).unwrap();
        let (_, rating) = updater.on_session_completed("u-1", 30).unwrap();
        // 1000 + (16 + 2) + (6 + 2)
        assert_eq!(rating.elo, 1026);
        assert_eq!(rating.points, 110);
    }
}
