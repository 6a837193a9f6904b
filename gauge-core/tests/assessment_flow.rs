//! End-to-end assessment flows against a file-backed store

use std::sync::Arc;

use gauge_core::{
    AssessmentEngine, Difficulty, Mode, PersonalizedOptions, QuestionFormat, Scenario,
    ScriptedProvider, SessionId, SessionView, SqliteSessionStore,
};
use tempfile::TempDir;

fn engine_at(
    dir: &TempDir,
) -> (AssessmentEngine<SqliteSessionStore>, Arc<SqliteSessionStore>) {
    let store = Arc::new(SqliteSessionStore::open(dir.path().join("gauge.db")).unwrap());
    let provider = Arc::new(ScriptedProvider::new());
    let engine = AssessmentEngine::new(
        store.clone(),
        provider.clone(),
        provider.clone(),
        provider,
    );
    (engine, store)
}

fn session_id(view: &SessionView) -> SessionId {
    match view {
        SessionView::Familiarity { session_id, .. }
        | SessionView::Question { session_id, .. }
        | SessionView::Completed { session_id, .. } => *session_id,
    }
}

#[tokio::test]
async fn pre_then_post_journey() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = engine_at(&dir);
    use gauge_core::SessionStore;
    store
        .put_scenario(&Scenario::new("phish", "Phishing Response", "Security"))
        .unwrap();

    // Pre-assessment: not familiar, so it starts Easy
    let view = engine.start("dana", "phish", Mode::Pre, None).await.unwrap();
    let pre_id = session_id(&view);
    let view = engine.submit_familiarity(&pre_id, false).await.unwrap();
    let SessionView::Question { difficulty, .. } = &view else {
        panic!("expected a question, got {view:?}");
    };
    assert_eq!(*difficulty, Difficulty::Easy);

    // Skill-mentioning answers grade 85 each, settling the baseline after
    // the two-turn minimum
    engine
        .submit_answer(&pre_id, Some("Check with the security team first"), false)
        .await
        .unwrap();
    let view = engine
        .submit_answer(&pre_id, Some("Report it through the security portal"), false)
        .await
        .unwrap();
    let SessionView::Completed { final_score: pre_score, .. } = view else {
        panic!("expected completion, got {view:?}");
    };
    assert_eq!(pre_score, 85);

    // Post-assessment runs the full seven turns and ends with feedback
    let view = engine.start("dana", "phish", Mode::Post, None).await.unwrap();
    let post_id = session_id(&view);
    let mut view = view;
    let post_score = loop {
        match view {
            SessionView::Completed {
                final_score,
                feedback,
                ..
            } => {
                assert!(feedback.is_some());
                break final_score;
            }
            _ => {
                view = engine
                    .submit_answer(&post_id, Some("Follow the security playbook"), false)
                    .await
                    .unwrap();
            }
        }
    };
    assert_eq!(post_score, 85);

    let delta = engine.training_delta("dana", "phish").unwrap().unwrap();
    assert_eq!(delta, 0);

    // The completed sessions feed the skill profile
    use gauge_core::ProfileStore;
    let (profile, rating) = store.get_profile("dana").unwrap();
    assert_eq!(profile.skills.get("Security"), Some(&85));
    assert!(rating.elo > 1000);
}

#[tokio::test]
async fn session_survives_restart() {
    let dir = TempDir::new().unwrap();

    let first_question = {
        let (engine, store) = engine_at(&dir);
        use gauge_core::SessionStore;
        store
            .put_scenario(&Scenario::new("gdpr", "Data Handling", "Compliance"))
            .unwrap();

        let view = engine.start("sam", "gdpr", Mode::Pre, None).await.unwrap();
        let id = session_id(&view);
        let view = engine.submit_familiarity(&id, true).await.unwrap();
        let SessionView::Question { question, .. } = view else {
            panic!("expected a question");
        };
        question
    };

    // A fresh engine over the same database resumes the pending question
    let (engine, _store) = engine_at(&dir);
    let view = engine.start("sam", "gdpr", Mode::Pre, None).await.unwrap();
    let SessionView::Question {
        question,
        question_number,
        difficulty,
        ..
    } = view
    else {
        panic!("expected a question");
    };
    assert_eq!(question, first_question);
    assert_eq!(question_number, 1);
    assert_eq!(difficulty, Difficulty::Normal);
}

#[tokio::test]
async fn personalized_multiple_choice_run() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = engine_at(&dir);
    use gauge_core::SessionStore;
    store
        .put_scenario(&Scenario::new("deesc", "De-escalation", "Support"))
        .unwrap();

    let options = PersonalizedOptions {
        difficulty: Difficulty::Hard,
        format: QuestionFormat::MultipleChoice,
        question_count: 3,
    };
    let view = engine
        .start("lee", "deesc", Mode::Personalized, Some(options))
        .await
        .unwrap();
    let id = session_id(&view);

    let mut view = view;
    for expected_number in 1..=3u32 {
        let SessionView::Question {
            options,
            question_number,
            difficulty,
            ..
        } = &view
        else {
            panic!("expected a question, got {view:?}");
        };
        assert_eq!(*question_number, expected_number);
        assert_eq!(*difficulty, Difficulty::Hard);
        assert_eq!(options.len(), 4);

        // Answer the first two correctly, skip the last
        view = if expected_number < 3 {
            let pick = options[0].clone();
            engine.submit_answer(&id, Some(&pick), false).await.unwrap()
        } else {
            engine.submit_answer(&id, None, true).await.unwrap()
        };
    }

    let SessionView::Completed {
        final_score,
        last_feedback,
        feedback,
        ..
    } = view
    else {
        panic!("expected completion, got {view:?}");
    };
    // round((100 + 100 + 0) / 3) = 67
    assert_eq!(final_score, 67);
    // Skips reveal the correct answer
    assert!(last_feedback.unwrap().contains("correct answer"));
    // Synthesized feedback is a post-assessment feature only
    assert!(feedback.is_none());
}
