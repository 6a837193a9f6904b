//! Session storage trait and SQLite implementation
//!
//! The store is the sole durable holder of session state. Mutations arrive
//! as whole-aggregate writes: `advance_session` persists the session header
//! and the newly graded turn in one transaction, so a failed upstream call
//! never leaves a half-committed turn behind.

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;

use super::error::AssessmentError;
use super::migrations::Migrator;
use super::types::{
    AssessmentSession, Difficulty, Mode, Question, QuestionFormat, Scenario, SessionId,
    SessionStatus, Turn, now_unix,
};
use crate::profile::{ProfileStore, Rating, SkillProfile};

/// Session storage trait
pub trait SessionStore: Send + Sync {
    fn put_scenario(&self, scenario: &Scenario) -> Result<(), AssessmentError>;
    fn get_scenario(&self, id: &str) -> Result<Option<Scenario>, AssessmentError>;
    fn list_scenarios(&self) -> Result<Vec<Scenario>, AssessmentError>;

    fn insert_session(&self, session: &AssessmentSession) -> Result<(), AssessmentError>;
    fn get_session(&self, id: &SessionId) -> Result<Option<AssessmentSession>, AssessmentError>;
    fn find_session(
        &self,
        user_id: &str,
        scenario_id: &str,
        mode: Mode,
    ) -> Result<Option<AssessmentSession>, AssessmentError>;

    /// Persist the session header and, when present, append the newly
    /// graded turn (already the last element of `session.turns`). Atomic:
    /// either both land or neither does.
    fn advance_session(
        &self,
        session: &AssessmentSession,
        new_turn: Option<&Turn>,
    ) -> Result<(), AssessmentError>;
}

/// SQLite-backed session store
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open or create database at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AssessmentError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, AssessmentError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), AssessmentError> {
        let conn = self.conn.lock().unwrap();
        Migrator::new(&conn).migrate()
    }

    fn row_to_session(row: &rusqlite::Row) -> Result<AssessmentSession, rusqlite::Error> {
        let id_str: String = row.get(0)?;
        let mode_str: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let difficulty_str: String = row.get(8)?;
        let format_str: String = row.get(9)?;
        let pending_json: Option<String> = row.get(10)?;
        let feedback_json: Option<String> = row.get(12)?;

        Ok(AssessmentSession {
            id: SessionId::parse(&id_str).unwrap_or_default(),
            user_id: row.get(1)?,
            scenario_id: row.get(2)?,
            skill: row.get(3)?,
            mode: Mode::parse(&mode_str).unwrap_or(Mode::Pre),
            status: SessionStatus::parse(&status_str).unwrap_or(SessionStatus::InProgress),
            turn_index: row.get(6)?,
            turn_limit: row.get(7)?,
            difficulty: Difficulty::parse(&difficulty_str).unwrap_or_default(),
            format: QuestionFormat::parse(&format_str).unwrap_or_default(),
            turns: Vec::new(),
            pending_question: pending_json
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            final_score: row.get(11)?,
            feedback: feedback_json
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            created_at: row.get(13)?,
            completed_at: row.get(14)?,
        })
    }

    fn load_turns(
        conn: &Connection,
        session_id: &SessionId,
    ) -> Result<Vec<Turn>, AssessmentError> {
        let mut stmt = conn.prepare(
            "SELECT question, answer, skipped, score, feedback, answered_at
             FROM turns WHERE session_id = ?1 ORDER BY ord ASC",
        )?;
        let rows = stmt.query_map([session_id.to_string()], |row| {
            let question_json: String = row.get(0)?;
            let skipped: i64 = row.get(2)?;
            Ok((
                question_json,
                row.get::<_, Option<String>>(1)?,
                skipped != 0,
                row.get::<_, u8>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (question_json, answer, skipped, score, feedback, answered_at) = row?;
            let question: Question = serde_json::from_str(&question_json)?;
            turns.push(Turn {
                question,
                answer,
                skipped,
                score,
                feedback,
                answered_at,
            });
        }
        Ok(turns)
    }

    fn write_session_header(
        conn: &Connection,
        session: &AssessmentSession,
    ) -> Result<(), AssessmentError> {
        let pending = session
            .pending_question
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let feedback = session
            .feedback
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            "UPDATE sessions SET
                status = ?2, turn_index = ?3, difficulty = ?4,
                pending_question = ?5, final_score = ?6, feedback = ?7,
                completed_at = ?8
             WHERE id = ?1",
            rusqlite::params![
                session.id.to_string(),
                session.status.as_str(),
                session.turn_index,
                session.difficulty.as_str(),
                pending,
                session.final_score,
                feedback,
                session.completed_at,
            ],
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn put_scenario(&self, scenario: &Scenario) -> Result<(), AssessmentError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO scenarios (id, title, skill, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title, skill = excluded.skill,
                description = excluded.description",
            rusqlite::params![
                scenario.id,
                scenario.title,
                scenario.skill,
                scenario.description,
                now_unix(),
            ],
        )?;
        Ok(())
    }

    fn get_scenario(&self, id: &str) -> Result<Option<Scenario>, AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let scenario = conn
            .query_row(
                "SELECT id, title, skill, description FROM scenarios WHERE id = ?1",
                [id],
                |row| {
                    Ok(Scenario {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        skill: row.get(2)?,
                        description: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(scenario)
    }

    fn list_scenarios(&self) -> Result<Vec<Scenario>, AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, skill, description FROM scenarios ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Scenario {
                id: row.get(0)?,
                title: row.get(1)?,
                skill: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_session(&self, session: &AssessmentSession) -> Result<(), AssessmentError> {
        let pending = session
            .pending_question
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions
                (id, user_id, scenario_id, skill, mode, status, turn_index, turn_limit,
                 difficulty, format, pending_question, final_score, feedback,
                 created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                session.id.to_string(),
                session.user_id,
                session.scenario_id,
                session.skill,
                session.mode.as_str(),
                session.status.as_str(),
                session.turn_index,
                session.turn_limit,
                session.difficulty.as_str(),
                session.format.as_str(),
                pending,
                session.final_score,
                Option::<String>::None,
                session.created_at,
                session.completed_at,
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> Result<Option<AssessmentSession>, AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                "SELECT id, user_id, scenario_id, skill, mode, status, turn_index, turn_limit,
                        difficulty, format, pending_question, final_score, feedback,
                        created_at, completed_at
                 FROM sessions WHERE id = ?1",
                [id.to_string()],
                Self::row_to_session,
            )
            .optional()?;

        match session {
            Some(mut session) => {
                session.turns = Self::load_turns(&conn, &session.id)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    fn find_session(
        &self,
        user_id: &str,
        scenario_id: &str,
        mode: Mode,
    ) -> Result<Option<AssessmentSession>, AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                "SELECT id, user_id, scenario_id, skill, mode, status, turn_index, turn_limit,
                        difficulty, format, pending_question, final_score, feedback,
                        created_at, completed_at
                 FROM sessions WHERE user_id = ?1 AND scenario_id = ?2 AND mode = ?3",
                rusqlite::params![user_id, scenario_id, mode.as_str()],
                Self::row_to_session,
            )
            .optional()?;

        match session {
            Some(mut session) => {
                session.turns = Self::load_turns(&conn, &session.id)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    fn advance_session(
        &self,
        session: &AssessmentSession,
        new_turn: Option<&Turn>,
    ) -> Result<(), AssessmentError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        Self::write_session_header(&tx, session)?;

        if let Some(turn) = new_turn {
            let question = serde_json::to_string(&turn.question)?;
            tx.execute(
                "INSERT INTO turns (session_id, ord, question, answer, skipped, score,
                                    feedback, answered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    session.id.to_string(),
                    session.turns.len().saturating_sub(1),
                    question,
                    turn.answer,
                    turn.skipped as i64,
                    turn.score,
                    turn.feedback,
                    turn.answered_at,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl ProfileStore for SqliteSessionStore {
    fn completed_scores(&self, user_id: &str) -> Result<Vec<(String, u8)>, AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT skill, final_score FROM sessions
             WHERE user_id = ?1 AND status = 'completed' AND final_score IS NOT NULL
             ORDER BY completed_at ASC",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u8>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_profile(&self, user_id: &str) -> Result<(SkillProfile, Rating), AssessmentError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT skills, elo, points FROM profiles WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, u32>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((skills_json, elo, points)) => {
                let profile = serde_json::from_str(&skills_json)?;
                Ok((profile, Rating { elo, points }))
            }
            None => Ok((SkillProfile::default(), Rating::default())),
        }
    }

    fn save_profile(
        &self,
        user_id: &str,
        profile: &SkillProfile,
        rating: &Rating,
    ) -> Result<(), AssessmentError> {
        let skills = serde_json::to_string(profile)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO profiles (user_id, skills, elo, points, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                skills = excluded.skills, elo = excluded.elo,
                points = excluded.points, updated_at = excluded.updated_at",
            rusqlite::params![user_id, skills, rating.elo, rating.points, now_unix()],
        )?;
        Ok(())
    }
}
