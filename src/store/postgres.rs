// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction, types::Json};

use crate::{
    error::AppError,
    models::{
        answer::{AnswerGrade, SessionAnswer},
        permission::{Permission, Role},
        question::{Question, QuestionOption},
        session::TestSession,
    },
    store::{PageWindow, RoleStore, SessionFilter, SessionStore, SessionTx},
};

/// Logs a database failure and converts it into an internal error.
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        AppError::from(e)
    }
}

/// Postgres-backed store for sessions, answers, questions and roles.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the WHERE clause for a session listing.
fn push_session_filter(query_builder: &mut QueryBuilder<'_, Postgres>, filter: &SessionFilter) {
    query_builder.push(" WHERE TRUE");

    if let Some(owner) = filter.owner {
        query_builder.push(" AND user_id = ").push_bind(owner);
    }

    if !filter.statuses.is_empty() {
        query_builder.push(" AND status IN (");
        let mut separated = query_builder.separated(", ");
        for status in &filter.statuses {
            separated.push_bind(*status);
        }
        separated.push_unseparated(")");
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn SessionTx>, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("open transaction"))?;

        Ok(Box::new(PgSessionTx { tx }))
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<TestSession>, AppError> {
        sqlx::query_as::<_, TestSession>(
            r#"
            SELECT
                id, user_id, test_id, status, max_points, points_earned,
                started_at, completed_at, expired_at, created_at, updated_at
            FROM test_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch session"))
    }

    async fn session_answers(&self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError> {
        sqlx::query_as::<_, SessionAnswer>(
            r#"
            SELECT id, session_id, question_id, is_correct, points, metadata, position
            FROM session_answers
            WHERE session_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch session answers"))
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
        window: PageWindow,
    ) -> Result<(Vec<TestSession>, i64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM test_sessions");
        push_session_filter(&mut count_query, filter);

        let total_items = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count sessions"))?;

        let mut query_builder = QueryBuilder::<Postgres>::new(
            "SELECT
                id, user_id, test_id, status, max_points, points_earned,
                started_at, completed_at, expired_at, created_at, updated_at
            FROM test_sessions",
        );
        push_session_filter(&mut query_builder, filter);
        query_builder
            .push(" ORDER BY updated_at DESC, id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);

        let sessions = query_builder
            .build_query_as::<TestSession>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list sessions"))?;

        Ok((sessions, total_items))
    }
}

/// Helper struct for the flattened role/permission join.
#[derive(sqlx::FromRow)]
struct RoleGrant {
    role_id: i64,
    role_name: String,
    permission: Option<String>,
}

#[async_trait]
impl RoleStore for PgStore {
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AppError> {
        let grants = sqlx::query_as::<_, RoleGrant>(
            r#"
            SELECT
                r.id AS role_id,
                r.name AS role_name,
                p.name AS permission
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch user roles"))?;

        let mut roles: Vec<Role> = Vec::new();
        for grant in grants {
            if roles.last().map(|r| r.id) != Some(grant.role_id) {
                roles.push(Role {
                    id: grant.role_id,
                    name: grant.role_name,
                    permissions: Vec::new(),
                });
            }

            // Roles without any permission still appear, with an empty list.
            let Some(name) = grant.permission else {
                continue;
            };
            match name.parse::<Permission>() {
                Ok(permission) => {
                    if let Some(role) = roles.last_mut() {
                        role.permissions.push(permission);
                    }
                }
                Err(e) => tracing::warn!("Skipping grant for role {}: {}", grant.role_id, e),
            }
        }

        Ok(roles)
    }
}

/// Unit of work over one Postgres transaction.
pub struct PgSessionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SessionTx for PgSessionTx {
    async fn find_submittable_session(
        &mut self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<TestSession>, AppError> {
        sqlx::query_as::<_, TestSession>(
            r#"
            SELECT
                id, user_id, test_id, status, max_points, points_earned,
                started_at, completed_at, expired_at, created_at, updated_at
            FROM test_sessions
            WHERE id = $1 AND user_id = $2 AND status = 'in_progress'
            FOR UPDATE
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("lock session for submission"))
    }

    async fn blank_answers(&mut self, session_id: i64) -> Result<Vec<SessionAnswer>, AppError> {
        sqlx::query_as::<_, SessionAnswer>(
            r#"
            SELECT id, session_id, question_id, is_correct, points, metadata, position
            FROM session_answers
            WHERE session_id = $1 AND points IS NULL
            ORDER BY position, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("fetch blank answers"))
    }

    async fn questions_by_ids(&mut self, question_ids: &[i64]) -> Result<Vec<Question>, AppError> {
        sqlx::query_as::<_, Question>(
            "SELECT id, test_id, content, points FROM questions WHERE id = ANY($1)",
        )
        .bind(question_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("fetch questions"))
    }

    async fn options_for_questions(
        &mut self,
        question_ids: &[i64],
    ) -> Result<Vec<QuestionOption>, AppError> {
        sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, content, is_correct
            FROM question_options
            WHERE question_id = ANY($1)
            ORDER BY question_id, id
            "#,
        )
        .bind(question_ids)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("fetch question options"))
    }

    async fn record_grade(
        &mut self,
        session_id: i64,
        grade: &AnswerGrade,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE session_answers
            SET is_correct = $3, points = $4, metadata = $5
            WHERE session_id = $1 AND question_id = $2
            "#,
        )
        .bind(session_id)
        .bind(grade.question_id)
        .bind(grade.is_correct)
        .bind(grade.points)
        .bind(Json(grade.metadata.to_value()))
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("record answer grade"))?;

        Ok(result.rows_affected())
    }

    async fn complete_session(
        &mut self,
        session_id: i64,
        points_earned: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<TestSession>, AppError> {
        sqlx::query_as::<_, TestSession>(
            r#"
            UPDATE test_sessions
            SET status = 'completed', points_earned = $2, completed_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'in_progress'
            RETURNING
                id, user_id, test_id, status, max_points, points_earned,
                started_at, completed_at, expired_at, created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(points_earned)
        .bind(completed_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("complete session"))
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx.commit().await.map_err(db_error("commit transaction"))
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        let this = *self;
        this.tx
            .rollback()
            .await
            .map_err(db_error("roll back transaction"))
    }
}
