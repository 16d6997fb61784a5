// src/services/result.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        answer::{AnswerMetadata, SessionAnswer},
        session::{QuestionResult, SessionResult, SessionStatus, SessionSummary, TestSession},
    },
    services::Viewer,
    store::SessionStore,
};

/// Read-only assembly of a completed session's graded results.
#[derive(Clone)]
pub struct ResultAssembler {
    store: Arc<dyn SessionStore>,
}

impl ResultAssembler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Loads a completed session and its per-question outcomes.
    ///
    /// Checks run in order: existence, ownership (skipped for full-access
    /// viewers), completion.
    pub async fn get_result(
        &self,
        viewer: Viewer,
        session_id: i64,
    ) -> Result<SessionResult, AppError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if !viewer.full_access && !session.is_owned_by(viewer.user_id) {
            return Err(AppError::Unauthorized(
                "You are not allowed to view this session.".to_string(),
            ));
        }

        if session.status != SessionStatus::Completed {
            return Err(AppError::InvalidState("Session is not completed".to_string()));
        }

        let answers = self.store.session_answers(session.id).await?;
        Ok(assemble(&session, &answers))
    }
}

fn assemble(session: &TestSession, answers: &[SessionAnswer]) -> SessionResult {
    let answers = answers
        .iter()
        .map(|answer| QuestionResult {
            question_id: answer.question_id,
            is_correct: answer.is_correct,
            selected_options: AnswerMetadata::decode(answer.metadata.as_deref())
                .selected_options,
        })
        .collect();

    SessionResult {
        session: SessionSummary::from(session),
        answers,
    }
}
