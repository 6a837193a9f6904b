//! Score aggregation
//!
//! The final score is the unweighted arithmetic mean over all turns,
//! skipped turns included (they score 0). Difficulty does not weight the
//! result; the formula lives here so that decision stays in one place.

use super::types::Turn;

/// Mean of the turn scores. 0.0 for an empty slice.
pub fn mean_score(turns: &[Turn]) -> f64 {
    if turns.is_empty() {
        return 0.0;
    }
    let sum: u32 = turns.iter().map(|t| t.score as u32).sum();
    sum as f64 / turns.len() as f64
}

/// Final session score: rounded mean over all graded turns
pub fn aggregate(turns: &[Turn]) -> u8 {
    mean_score(turns).round() as u8
}

/// Rounded mean so far, `None` before any turn has been graded
pub fn running_score(turns: &[Turn]) -> Option<u8> {
    if turns.is_empty() {
        None
    } else {
        Some(aggregate(turns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::types::{Difficulty, Question, QuestionFormat};

    fn turn(score: u8) -> Turn {
        Turn {
            question: Question {
                prompt: String::new(),
                text: "q".into(),
                format: QuestionFormat::Text,
                options: vec![],
                correct_answer: None,
                hint: String::new(),
                skill: "Ops".into(),
                difficulty: Difficulty::Normal,
            },
            answer: Some("a".into()),
            skipped: false,
            score,
            feedback: String::new(),
            answered_at: 0,
        }
    }

    #[test]
    fn aggregate_rounds_mean() {
        // Worked example: round(mean([80,85,90,40,60,70,75])) = round(71.43) = 71
        let turns: Vec<Turn> = [80, 85, 90, 40, 60, 70, 75].map(turn).into();
        assert_eq!(aggregate(&turns), 71);
    }

    #[test]
    fn skipped_turns_count_as_zero() {
        let mut skipped = turn(0);
        skipped.answer = None;
        skipped.skipped = true;
        let turns = vec![turn(100), skipped];
        assert_eq!(aggregate(&turns), 50);
    }

    #[test]
    fn running_score_empty_is_none() {
        assert_eq!(running_score(&[]), None);
        assert_eq!(running_score(&[turn(64)]), Some(64));
    }

    #[test]
    fn aggregate_empty_is_zero() {
        assert_eq!(aggregate(&[]), 0);
    }
}
