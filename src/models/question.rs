// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,

    /// The text content of the question.
    pub content: String,

    /// Maximum points awardable for this question.
    pub points: i32,
}

/// Represents the 'question_options' table in the database.
///
/// The options flagged `is_correct` for a question form its unique
/// correct answer set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,

    /// Display text shown to the test taker.
    pub content: String,

    #[serde(skip_serializing)]
    pub is_correct: bool,
}
