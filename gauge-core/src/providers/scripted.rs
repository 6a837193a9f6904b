//! Deterministic offline provider
//!
//! Generates templated questions and grades with a simple heuristic. Used
//! by tests, demos, and deployments without a generator service.

use async_trait::async_trait;

use super::{
    FeedbackRequest, FeedbackSynthesizer, Grade, GradeRequest, PersonalizedFeedback,
    ProviderError, QuestionRequest, QuestionSource, Scorer,
};
use crate::assessment::{Question, QuestionFormat};

/// Question angles cycled by question number so one session never repeats
const ASPECTS: &[&str] = &[
    "the core concept",
    "a common mistake",
    "applying it under time pressure",
    "explaining it to a colleague",
    "handling an edge case",
    "prioritizing between options",
    "recognizing when it applies",
];

/// Deterministic question source, scorer, and feedback synthesizer
#[derive(Debug, Default, Clone)]
pub struct ScriptedProvider;

impl ScriptedProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuestionSource for ScriptedProvider {
    async fn next_question(&self, request: &QuestionRequest) -> Result<Question, ProviderError> {
        let aspect = ASPECTS[(request.question_number as usize - 1) % ASPECTS.len()];
        let text = format!(
            "Regarding {} in {}, how would you handle {}?",
            request.skill, request.scenario_title, aspect
        );

        let (options, correct_answer) = match request.format {
            QuestionFormat::Text => (vec![], None),
            QuestionFormat::MultipleChoice => {
                let correct = format!("Apply the {} guidance from the training", request.skill);
                let options = vec![
                    correct.clone(),
                    "Escalate immediately without assessing".to_string(),
                    "Ignore it and continue your current task".to_string(),
                    "Wait for someone else to notice".to_string(),
                ];
                (options, Some(correct))
            }
        };

        Ok(Question {
            prompt: format!(
                "You are partway through your work day when a situation involving {} comes up.",
                request.scenario_title
            ),
            text,
            format: request.format,
            options,
            correct_answer,
            hint: format!("Think about how {} applies to your daily work.", request.skill),
            skill: request.skill.clone(),
            difficulty: request.difficulty,
        })
    }
}

#[async_trait]
impl Scorer for ScriptedProvider {
    async fn grade(&self, request: &GradeRequest) -> Result<Grade, ProviderError> {
        let answer = request.answer.to_lowercase();
        let mentions_skill = answer.contains(&request.skill.to_lowercase());

        let (score, feedback) = if mentions_skill {
            (
                85,
                format!("Good answer that connects back to {}.", request.skill),
            )
        } else if answer.split_whitespace().count() >= 8 {
            (
                55,
                "A reasonable attempt, but it misses the key idea from the training.".to_string(),
            )
        } else {
            (
                30,
                format!(
                    "Too brief. A strong answer would demonstrate {} in practice.",
                    request.skill
                ),
            )
        };

        Ok(Grade { score, feedback })
    }
}

#[async_trait]
impl FeedbackSynthesizer for ScriptedProvider {
    async fn synthesize(
        &self,
        request: &FeedbackRequest,
    ) -> Result<PersonalizedFeedback, ProviderError> {
        let strengths: Vec<String> = request
            .turns
            .iter()
            .filter(|t| t.score >= 70)
            .take(2)
            .map(|t| t.question.clone())
            .collect();
        let weaknesses: Vec<String> = request
            .turns
            .iter()
            .filter(|t| t.score < 50)
            .take(2)
            .map(|t| t.question.clone())
            .collect();

        let summary = format!(
            "You scored {}% across {} questions on {}.",
            request.final_score,
            request.turns.len(),
            request.skill
        );

        let recommendations = if request.final_score >= 70 {
            vec![format!(
                "Keep applying {} in real situations to consolidate it.",
                request.skill
            )]
        } else {
            vec![
                format!("Revisit the training material on {}.", request.skill),
                "Retake the assessment after reviewing the weak areas.".to_string(),
            ]
        };

        Ok(PersonalizedFeedback {
            summary,
            strengths,
            weaknesses,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{Difficulty, Mode};

    fn request(number: u32, format: QuestionFormat) -> QuestionRequest {
        QuestionRequest {
            scenario_title: "Incident Response".into(),
            scenario_description: String::new(),
            skill: "Security".into(),
            difficulty: Difficulty::Normal,
            mode: Mode::Post,
            format,
            question_number: number,
            prior: vec![],
        }
    }

    #[tokio::test]
    async fn questions_vary_by_number() {
        let provider = ScriptedProvider::new();
        let q1 = provider
            .next_question(&request(1, QuestionFormat::Text))
            .await
            .unwrap();
        let q2 = provider
            .next_question(&request(2, QuestionFormat::Text))
            .await
            .unwrap();
        assert_ne!(q1.text, q2.text);
        assert!(q1.options.is_empty());
        assert!(q1.correct_answer.is_none());
    }

    #[tokio::test]
    async fn multiple_choice_carries_correct_answer() {
        let provider = ScriptedProvider::new();
        let q = provider
            .next_question(&request(1, QuestionFormat::MultipleChoice))
            .await
            .unwrap();
        assert_eq!(q.options.len(), 4);
        let correct = q.correct_answer.unwrap();
        assert!(q.options.contains(&correct));
    }

    #[tokio::test]
    async fn grading_rewards_skill_mentions() {
        let provider = ScriptedProvider::new();
        let grade = provider
            .grade(&GradeRequest {
                scenario: String::new(),
                question: "q".into(),
                answer: "I would follow the security checklist first".into(),
                skill: "Security".into(),
            })
            .await
            .unwrap();
        assert_eq!(grade.score, 85);

        let grade = provider
            .grade(&GradeRequest {
                scenario: String::new(),
                question: "q".into(),
                answer: "no idea".into(),
                skill: "Security".into(),
            })
            .await
            .unwrap();
        assert_eq!(grade.score, 30);
    }

    #[tokio::test]
    async fn feedback_splits_strengths_and_weaknesses() {
        let provider = ScriptedProvider::new();
        let feedback = provider
            .synthesize(&FeedbackRequest {
                skill: "Security".into(),
                final_score: 60,
                turns: vec![
                    super::super::FeedbackTurn {
                        question: "strong one".into(),
                        answer: "a".into(),
                        score: 90,
                    },
                    super::super::FeedbackTurn {
                        question: "weak one".into(),
                        answer: "b".into(),
                        score: 30,
                    },
                ],
            })
            .await
            .unwrap();
        assert_eq!(feedback.strengths, vec!["strong one".to_string()]);
        assert_eq!(feedback.weaknesses, vec!["weak one".to_string()]);
        assert!(!feedback.recommendations.is_empty());
    }
}
