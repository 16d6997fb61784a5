// tests/common/mod.rs
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use assessment_backend::{
    error::AppError,
    models::{
        answer::{AnswerGrade, SessionAnswer},
        permission::{Permission, Role},
        question::{Question, QuestionOption},
        session::{SessionStatus, TestSession},
    },
    store::{PageWindow, RoleStore, SessionFilter, SessionStore, SessionTx},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub sessions: Vec<TestSession>,
    pub answers: Vec<SessionAnswer>,
    pub questions: Vec<Question>,
    pub options: Vec<QuestionOption>,
    pub roles: HashMap<i64, Vec<Role>>,
}

/// In-memory store. A transaction works on a private copy of the tables and
/// publishes it on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// When set, another submission commits the session's completion right
    /// before the next transaction tries to complete it.
    competing_completion: Arc<AtomicBool>,
    role_lookups: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn complete_concurrently_on_next_submit(&self) {
        self.competing_completion.store(true, Ordering::SeqCst);
    }

    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    pub fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.lock().unwrap())
    }

    pub fn session(&self, id: i64) -> TestSession {
        self.snapshot()
            .sessions
            .into_iter()
            .find(|s| s.id == id)
            .expect("session exists")
    }

    pub fn answers_of(&self, session_id: i64) -> Vec<SessionAnswer> {
        self.snapshot()
            .answers
            .into_iter()
            .filter(|a| a.session_id == session_id)
            .collect()
    }

    pub fn grant(&self, user_id: i64, role_name: &str, permissions: &[Permission]) {
        self.with_tables(|t| {
            let roles = t.roles.entry(user_id).or_default();
            roles.push(Role {
                id: roles.len() as i64 + 1,
                name: role_name.to_string(),
                permissions: permissions.to_vec(),
            });
        });
    }

    pub fn add_session(&self, id: i64, user_id: Option<i64>, status: SessionStatus) -> TestSession {
        self.add_session_at(id, user_id, status, Utc::now())
    }

    pub fn add_session_at(
        &self,
        id: i64,
        user_id: Option<i64>,
        status: SessionStatus,
        updated_at: DateTime<Utc>,
    ) -> TestSession {
        let session = TestSession {
            id,
            user_id,
            test_id: 1,
            status,
            max_points: 0,
            points_earned: None,
            started_at: updated_at - Duration::minutes(30),
            completed_at: None,
            expired_at: None,
            created_at: updated_at - Duration::minutes(30),
            updated_at,
        };
        self.with_tables(|t| t.sessions.push(session.clone()));
        session
    }

    /// Adds a question with options given as `(option_id, text, is_correct)`.
    pub fn add_question(&self, id: i64, points: i32, options: &[(i64, &str, bool)]) {
        self.with_tables(|t| {
            t.questions.push(Question {
                id,
                test_id: 1,
                content: format!("Question {}", id),
                points,
            });
            for (option_id, text, is_correct) in options {
                t.options.push(QuestionOption {
                    id: *option_id,
                    question_id: id,
                    content: text.to_string(),
                    is_correct: *is_correct,
                });
            }
        });
    }

    /// Pre-creates a blank answer row and adds the question's points to the
    /// session's maximum.
    pub fn add_blank_answer(&self, session_id: i64, question_id: i64) {
        self.with_tables(|t| {
            let id = t.answers.len() as i64 + 1;
            let position = t.answers.iter().filter(|a| a.session_id == session_id).count() as i32;
            t.answers.push(SessionAnswer {
                id,
                session_id,
                question_id,
                is_correct: None,
                points: None,
                metadata: None,
                position,
            });
            let points = t
                .questions
                .iter()
                .find(|q| q.id == question_id)
                .map(|q| q.points)
                .unwrap_or(0);
            if let Some(session) = t.sessions.iter_mut().find(|s| s.id == session_id) {
                session.max_points = session.max_points.saturating_add(points);
            }
        });
    }

    pub fn add_graded_answer(
        &self,
        session_id: i64,
        question_id: i64,
        is_correct: bool,
        points: i32,
        metadata: serde_json::Value,
    ) {
        self.with_tables(|t| {
            let id = t.answers.len() as i64 + 1;
            let position = t.answers.iter().filter(|a| a.session_id == session_id).count() as i32;
            t.answers.push(SessionAnswer {
                id,
                session_id,
                question_id,
                is_correct: Some(is_correct),
                points: Some(points),
                metadata: Some(Json(metadata)),
                position,
            });
        });
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn SessionTx>, AppError> {
        Ok(Box::new(MemoryTx {
            shared: self.tables.clone(),
            working: self.snapshot(),
            competing_completion: self.competing_completion.clone(),
        }))
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<TestSession>, AppError> {
        Ok(self
            .snapshot()
            .sessions
            .into_iter()
            .find(|s| s.id == session_id))
    }

    async fn session_answers(&self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError> {
        let mut answers = self.answers_of(session_id);
        answers.sort_by_key(|a| (a.position, a.id));
        Ok(answers)
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
        window: PageWindow,
    ) -> Result<(Vec<TestSession>, i64), AppError> {
        let mut matching: Vec<TestSession> = self
            .snapshot()
            .sessions
            .into_iter()
            .filter(|s| filter.owner.is_none() || s.user_id == filter.owner)
            .filter(|s| filter.statuses.is_empty() || filter.statuses.contains(&s.status))
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AppError> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot().roles.remove(&user_id).unwrap_or_default())
    }
}

pub struct MemoryTx {
    shared: Arc<Mutex<Tables>>,
    working: Tables,
    competing_completion: Arc<AtomicBool>,
}

#[async_trait]
impl SessionTx for MemoryTx {
    async fn find_submittable_session(
        &mut self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<TestSession>, AppError> {
        Ok(self
            .working
            .sessions
            .iter()
            .find(|s| {
                s.id == session_id
                    && s.user_id == Some(user_id)
                    && s.status == SessionStatus::InProgress
            })
            .cloned())
    }

    async fn blank_answers(&mut self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError> {
        Ok(self
            .working
            .answers
            .iter()
            .filter(|a| a.session_id == session_id && a.points.is_none())
            .cloned()
            .collect())
    }

    async fn questions_by_ids(&mut self, question_ids: &[i64]) -> Result<Vec<Question>, AppError> {
        Ok(self
            .working
            .questions
            .iter()
            .filter(|q| question_ids.contains(&q.id))
            .cloned()
            .collect())
    }

    async fn options_for_questions(
        &mut self,
        question_ids: &[i64],
    ) -> Result<Vec<QuestionOption>, AppError> {
        Ok(self
            .working
            .options
            .iter()
            .filter(|o| question_ids.contains(&o.question_id))
            .cloned()
            .collect())
    }

    async fn record_grade(
        &mut self,
        session_id: i64,
        grade: &AnswerGrade,
    ) -> Result<u64, AppError> {
        let mut rows = 0;
        for answer in self
            .working
            .answers
            .iter_mut()
            .filter(|a| a.session_id == session_id && a.question_id == grade.question_id)
        {
            answer.is_correct = Some(grade.is_correct);
            answer.points = Some(grade.points);
            answer.metadata = Some(Json(grade.metadata.to_value()));
            rows += 1;
        }
        Ok(rows)
    }

    async fn complete_session(
        &mut self,
        session_id: i64,
        points_earned: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<TestSession>, AppError> {
        if self.competing_completion.swap(false, Ordering::SeqCst) {
            let mut shared = self.shared.lock().unwrap();
            if let Some(other) = shared.sessions.iter_mut().find(|s| s.id == session_id) {
                other.status = SessionStatus::Completed;
                other.points_earned = Some(0);
                other.completed_at = Some(completed_at);
            }
        }

        // The status check sees committed state, like a conditional UPDATE.
        let committed_in_progress = self
            .shared
            .lock()
            .unwrap()
            .sessions
            .iter()
            .any(|s| s.id == session_id && s.status == SessionStatus::InProgress);
        if !committed_in_progress {
            return Ok(None);
        }

        let Some(session) = self
            .working
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.status == SessionStatus::InProgress)
        else {
            return Ok(None);
        };

        session.status = SessionStatus::Completed;
        session.points_earned = Some(points_earned);
        session.completed_at = Some(completed_at);
        session.updated_at = completed_at;
        Ok(Some(session.clone()))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        *this.shared.lock().unwrap() = this.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}

/// Three questions worth 10, 5 and 3 points, with session 1 (owned by user 1)
/// in progress and holding one blank answer per question.
///
/// * Q1 correct set {11, 12}, distractor 13.
/// * Q2 correct set {21}, distractor 22.
/// * Q3 correct set {31}, distractor 32.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    store.add_question(1, 10, &[(11, "O1", true), (12, "O2", true), (13, "O3", false)]);
    store.add_question(2, 5, &[(21, "Yes", true), (22, "No", false)]);
    store.add_question(3, 3, &[(31, "Red", true), (32, "Blue", false)]);

    store.add_session(1, Some(1), SessionStatus::InProgress);
    for question_id in [1, 2, 3] {
        store.add_blank_answer(1, question_id);
    }
    store
}
