// src/store/mod.rs

//! Persistence seam used by the services.
//!
//! `SessionStore` serves the read paths and opens `SessionTx` units of work
//! for scoring. A `SessionTx` must be finished with `commit` or `rollback`;
//! dropping one unfinished discards its writes.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        answer::{AnswerGrade, SessionAnswer},
        permission::Role,
        question::{Question, QuestionOption},
        session::{SessionStatus, TestSession},
    },
};

pub use postgres::PgStore;

/// Row filter for session listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Restrict to sessions owned by this user. `None` lists everyone's.
    pub owner: Option<i64>,
    /// Restrict to these statuses. Empty means any status.
    pub statuses: Vec<SessionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a transactional unit of work.
    async fn begin(&self) -> Result<Box<dyn SessionTx>, AppError>;

    async fn find_session(&self, session_id: i64) -> Result<Option<TestSession>, AppError>;

    /// All answers of a session, ordered by their position.
    async fn session_answers(&self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError>;

    /// One page of sessions, most recently updated first, plus the total
    /// number of rows matching `filter`.
    async fn list_sessions(
        &self,
        filter: &SessionFilter,
        window: PageWindow,
    ) -> Result<(Vec<TestSession>, i64), AppError>;
}

#[async_trait]
pub trait SessionTx: Send {
    /// Loads the session only if it belongs to `user_id` and is in progress,
    /// locking the row for the rest of the transaction.
    async fn find_submittable_session(
        &mut self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<TestSession>, AppError>;

    async fn blank_answers(&mut self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError>;

    async fn questions_by_ids(&mut self, question_ids: &[i64]) -> Result<Vec<Question>, AppError>;

    async fn options_for_questions(
        &mut self,
        question_ids: &[i64],
    ) -> Result<Vec<QuestionOption>, AppError>;

    /// Writes a grade onto the answer row(s) matching `(session_id,
    /// grade.question_id)` and returns the number of rows affected.
    async fn record_grade(
        &mut self,
        session_id: i64,
        grade: &AnswerGrade,
    ) -> Result<u64, AppError>;

    /// Moves the session from in progress to completed. Returns `None` when
    /// the session was no longer in progress.
    async fn complete_session(
        &mut self,
        session_id: i64,
        points_earned: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<TestSession>, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Every role assigned to the user, each with its permission list.
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AppError>;
}
