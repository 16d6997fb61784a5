// src/services/scoring.rs

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        answer::{AnswerGrade, AnswerMetadata, SubmittedAnswer},
        question::{Question, QuestionOption},
        session::TestSession,
    },
    store::{SessionStore, SessionTx},
    utils::lookup::{group_by, index_by},
};

/// Exact set equality between a selection and the correct option set.
///
/// Equal size plus every selected id being correct implies equal sets.
pub fn is_exact_match(selected: &HashSet<i64>, correct: &HashSet<i64>) -> bool {
    selected.len() == correct.len() && selected.iter().all(|id| correct.contains(id))
}

/// Grades one submitted answer against its question's options.
///
/// Repeated option ids count once. An option id that is not one of the
/// question's options is rejected.
pub fn grade_answer(
    question: &Question,
    options: &[QuestionOption],
    submitted: &SubmittedAnswer,
) -> Result<AnswerGrade, AppError> {
    let options_by_id = index_by(options.iter(), |option| option.id);

    let mut selected = HashSet::new();
    let mut selected_options = Vec::new();
    for option_id in &submitted.selected_option_ids {
        let option = options_by_id.get(option_id).ok_or_else(|| {
            AppError::Validation(format!(
                "Option {} does not belong to question {}",
                option_id, question.id
            ))
        })?;
        if selected.insert(*option_id) {
            selected_options.push(option.content.clone());
        }
    }

    let correct: HashSet<i64> = options
        .iter()
        .filter(|option| option.is_correct)
        .map(|option| option.id)
        .collect();

    let is_correct = is_exact_match(&selected, &correct);

    Ok(AnswerGrade {
        question_id: question.id,
        is_correct,
        points: if is_correct { question.points } else { 0 },
        metadata: AnswerMetadata { selected_options },
    })
}

/// Sums awarded points. A total that does not fit the session's point column
/// is reported instead of wrapping.
pub fn total_points(grades: &[AnswerGrade]) -> Result<i32, AppError> {
    grades.iter().try_fold(0i32, |total, grade| {
        total.checked_add(grade.points).ok_or_else(|| {
            AppError::Consistency(format!(
                "Total points overflow while adding {} for question {}",
                grade.points, grade.question_id
            ))
        })
    })
}

/// Executes the submit-and-grade transaction for a test session.
#[derive(Clone)]
pub struct ScoringEngine {
    store: Arc<dyn SessionStore>,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Grades every submitted answer and completes the session, atomically.
    ///
    /// * The session must belong to `user_id` and be in progress.
    /// * One answer must be submitted per blank answer row.
    /// * Any failure rolls back every write made so far.
    pub async fn submit_session(
        &self,
        user_id: i64,
        session_id: i64,
        answers: &[SubmittedAnswer],
    ) -> Result<TestSession, AppError> {
        let mut tx = self.store.begin().await?;

        let outcome = grade_and_complete(tx.as_mut(), user_id, session_id, answers).await;

        match outcome {
            Ok(session) => {
                tx.commit().await?;
                tracing::info!(
                    "Session {} completed: {}/{} points",
                    session.id,
                    session.points_earned.unwrap_or(0),
                    session.max_points
                );
                Ok(session)
            }
            Err(err) => {
                tracing::warn!("Submission of session {} rolled back: {}", session_id, err);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        "Failed to roll back submission of session {}: {}",
                        session_id,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

async fn grade_and_complete(
    tx: &mut dyn SessionTx,
    user_id: i64,
    session_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<TestSession, AppError> {
    // 1. The status predicate doubles as the double-submission guard.
    let session = tx
        .find_submittable_session(session_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found or not submittable".to_string()))?;

    // 2. One submitted answer per blank row.
    let blanks = tx.blank_answers(session.id).await?;
    if blanks.len() != answers.len() {
        return Err(AppError::CountMismatch {
            needed: blanks.len(),
            got: answers.len(),
        });
    }

    // 3. Bulk-load questions and their options.
    let mut question_ids: Vec<i64> = blanks.iter().map(|answer| answer.question_id).collect();
    question_ids.sort_unstable();
    question_ids.dedup();

    let questions = index_by(
        tx.questions_by_ids(&question_ids).await?,
        |question| question.id,
    );
    let options: HashMap<i64, Vec<QuestionOption>> = group_by(
        tx.options_for_questions(&question_ids).await?,
        |option| option.question_id,
    );

    // 4. Grade everything before writing anything.
    let mut seen = HashSet::new();
    let mut grades = Vec::with_capacity(answers.len());
    for submitted in answers {
        let question = questions.get(&submitted.question_id).ok_or_else(|| {
            AppError::Validation(
                "Submitted answer does not match any expected question".to_string(),
            )
        })?;

        if !seen.insert(submitted.question_id) {
            return Err(AppError::Validation(format!(
                "Question {} was answered more than once",
                submitted.question_id
            )));
        }

        let question_options = options
            .get(&question.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        grades.push(grade_answer(question, question_options, submitted)?);
    }

    // 5. Persist each grade onto exactly one answer row.
    for grade in &grades {
        let rows = tx.record_grade(session.id, grade).await?;
        if rows != 1 {
            return Err(AppError::Consistency(format!(
                "Expected to grade exactly one answer for question {} in session {}, updated {}",
                grade.question_id, session.id, rows
            )));
        }
    }

    // 6. Total.
    let points_earned = total_points(&grades)?;

    // 7. Compare-and-swap on status closes the double-submission race.
    tx.complete_session(session.id, points_earned, Utc::now())
        .await?
        .ok_or_else(|| AppError::InvalidState("Session is no longer in progress".to_string()))
}
