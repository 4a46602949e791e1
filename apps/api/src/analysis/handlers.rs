//! Axum route handler for resume analysis.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::orchestrator::Submission;
use crate::errors::AppError;
use crate::llm_client::cancellation;
use crate::models::analysis::AnalysisResponse;
use crate::state::AppState;

/// POST /analyze-job
///
/// Multipart fields: `job_description` (text) and `resume_file` (PDF).
/// If the client goes away, the dropped handler future cancels the model calls.
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let limit = state.config.max_upload_bytes;

    async move {
        let submission = read_submission(&mut multipart, limit).await?;
        info!("Received analysis request");

        let (_cancel_on_drop, cancellation) = cancellation();
        let response = state.analyzer.submit(submission, &cancellation).await?;

        info!(
            "Analysis complete: overall {} (local {})",
            response.gemini_analysis.overall_match_score, response.computed_overall_score
        );
        Ok::<_, AppError>(Json(response))
    }
    .instrument(info_span!("analyze_job", %request_id))
    .await
}

async fn read_submission(multipart: &mut Multipart, limit: usize) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
                submission.job_description = Some(text);
            }
            "resume_file" => {
                submission.filename = Some(field.file_name().unwrap_or_default().to_string());
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                submission.resume = Some(bytes);
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn multipart_error(error: MultipartError, limit: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", error.body_text()))
    }
}
