// src/models/session.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Lifecycle of a test session.
/// Mapped onto the Postgres enum type `session_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(SessionStatus::Pending),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(AppError::Validation(format!(
                "Unknown session status '{}'",
                other
            ))),
        }
    }
}

/// Represents the 'test_sessions' table in the database.
///
/// `points_earned` and `completed_at` stay unset until the session
/// transitions to `Completed`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestSession {
    pub id: i64,

    /// Owning user. Anonymous sessions have no owner.
    pub user_id: Option<i64>,

    pub test_id: i64,
    pub status: SessionStatus,
    pub max_points: i32,
    pub points_earned: Option<i32>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestSession {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Session header returned alongside graded answers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub test_id: i64,
    pub user_id: Option<i64>,
    pub status: SessionStatus,
    pub max_points: i32,
    pub points_earned: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&TestSession> for SessionSummary {
    fn from(session: &TestSession) -> Self {
        Self {
            id: session.id,
            test_id: session.test_id,
            user_id: session.user_id,
            status: session.status,
            max_points: session.max_points,
            points_earned: session.points_earned,
            started_at: session.started_at,
            completed_at: session.completed_at,
        }
    }
}

/// Graded outcome of one question, as read back after completion.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub is_correct: Option<bool>,
    pub selected_options: Vec<String>,
}

/// DTO for reading a completed session's results.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub session: SessionSummary,
    pub answers: Vec<QuestionResult>,
}

/// Query parameters for listing sessions.
#[derive(Debug, Default, Deserialize)]
pub struct SessionListParams {
    /// 1-based page number (default: 1).
    pub page: Option<i64>,

    /// Number of items per page (default: 20, max: 100).
    pub limit: Option<i64>,

    /// Comma-separated status names, e.g. `completed,in_progress`.
    pub status: Option<String>,
}

impl SessionListParams {
    /// Parses the `status` query value into a status set.
    /// An absent or blank value means "no status filter".
    pub fn statuses(&self) -> Result<Vec<SessionStatus>, AppError> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(Vec::new());
        };

        let mut statuses = Vec::new();
        for name in raw.split(',').filter(|s| !s.trim().is_empty()) {
            let status = name.parse::<SessionStatus>()?;
            if !statuses.contains(&status) {
                statuses.push(status);
            }
        }
        Ok(statuses)
    }
}

/// A single page of results plus the totals needed to navigate.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip() {
        for status in [
            SessionStatus::Pending,
            SessionStatus::InProgress,
            SessionStatus::Completed,
            SessionStatus::Cancelled,
            SessionStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_filter_parses_comma_list() {
        let params = SessionListParams {
            status: Some("completed, in_progress,completed,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            params.statuses().unwrap(),
            vec![SessionStatus::Completed, SessionStatus::InProgress]
        );
    }

    #[test]
    fn status_filter_rejects_unknown_names() {
        let params = SessionListParams {
            status: Some("finished".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.statuses(), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_status_means_no_filter() {
        assert!(SessionListParams::default().statuses().unwrap().is_empty());
    }
}
