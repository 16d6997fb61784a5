// src/models/answer.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Key under which the selected option texts are stored in answer metadata.
pub const SELECTED_OPTIONS_KEY: &str = "selected_options";

/// Represents the 'session_answers' table in the database.
///
/// An answer is "blank" while `points` is unset. Grading writes
/// `is_correct`, `points` and `metadata` together.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionAnswer {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    pub is_correct: Option<bool>,
    pub points: Option<i32>,

    /// Loosely typed JSONB blob. Read it through `AnswerMetadata::decode`.
    pub metadata: Option<Json<Value>>,

    /// Ordering index within the session.
    pub position: i32,
}

impl SessionAnswer {
    pub fn is_blank(&self) -> bool {
        self.points.is_none()
    }
}

/// Audit record persisted with a graded answer: the display text of every
/// selected option, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerMetadata {
    pub selected_options: Vec<String>,
}

impl AnswerMetadata {
    /// Decodes stored metadata.
    ///
    /// A missing blob, a missing key, or a value that is not a list of
    /// strings all decode to an empty selection. Reads never fail on this.
    pub fn decode(raw: Option<&Value>) -> Self {
        let Some(field) = raw.and_then(|value| value.get(SELECTED_OPTIONS_KEY)) else {
            return Self::default();
        };

        let selected = match field {
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<String>>>(),
            _ => None,
        };

        match selected {
            Some(selected_options) => Self { selected_options },
            None => {
                tracing::warn!(
                    "Answer metadata field '{}' has unexpected shape; treating as empty",
                    SELECTED_OPTIONS_KEY
                );
                Self::default()
            }
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ SELECTED_OPTIONS_KEY: self.selected_options })
    }
}

/// One answer as submitted by the test taker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_option_ids: Vec<i64>,
}

/// DTO for submitting a session.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SubmitSessionRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Between 1 and 500 answers must be submitted."
    ))]
    pub answers: Vec<SubmittedAnswer>,
}

/// Outcome of grading one submitted answer, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerGrade {
    pub question_id: i64,
    pub is_correct: bool,
    pub points: i32,
    pub metadata: AnswerMetadata,
}
