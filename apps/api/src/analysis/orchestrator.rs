//! Analysis Orchestrator.
//!
//! PDF text → normalizer → local heuristics, concurrently with the model call
//! (primary model, then fallbacks, each with bounded retries) → recovery → reconciliation.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::lexicon::Lexicon;
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::reconcile::{reconcile, ModelStructuredResult, Reconciled};
use crate::analysis::recovery::{recover, RecoveryStage};
use crate::analysis::scoring::LocalAnalysis;
use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::PdfExtractor;
use crate::llm_client::{call_with_retries, Cancellation, GenerativeService, LlmError, RetryPolicy};
use crate::models::analysis::{AnalysisResponse, LocalParsing};

/// One inbound analysis request as received, before validation.
#[derive(Debug, Default)]
pub struct Submission {
    pub job_description: Option<String>,
    pub filename: Option<String>,
    pub resume: Option<Bytes>,
}

/// A submission that passed validation. `resume` is the raw PDF, owned until extraction.
#[derive(Debug)]
pub struct ValidSubmission {
    pub job_description: String,
    pub resume: Bytes,
}

impl Submission {
    /// Checks, in order: job description, file presence, filename, extension, emptiness, size.
    pub fn validate(self, max_upload_bytes: usize) -> Result<ValidSubmission, AppError> {
        let job_description = self
            .job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;

        let resume = self
            .resume
            .ok_or_else(|| AppError::Validation("resume_file is required".to_string()))?;

        let filename = self.filename.unwrap_or_default();
        if filename.trim().is_empty() {
            return Err(AppError::Validation("No file selected".to_string()));
        }
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::Validation(
                "Only PDF files are supported".to_string(),
            ));
        }
        if resume.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if resume.len() > max_upload_bytes {
            return Err(AppError::PayloadTooLarge {
                limit: max_upload_bytes,
            });
        }

        Ok(ValidSubmission {
            job_description,
            resume,
        })
    }
}

pub struct Analyzer {
    service: Arc<dyn GenerativeService>,
    extractor: Arc<dyn PdfExtractor>,
    lexicon: Arc<Lexicon>,
    /// Primary model first, then fallbacks in order.
    models: Vec<String>,
    retry: RetryPolicy,
    max_upload_bytes: usize,
}

impl Analyzer {
    pub fn new(
        service: Arc<dyn GenerativeService>,
        extractor: Arc<dyn PdfExtractor>,
        lexicon: Arc<Lexicon>,
        models: Vec<String>,
        retry: RetryPolicy,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            service,
            extractor,
            lexicon,
            models,
            retry,
            max_upload_bytes,
        }
    }

    pub fn from_config(
        config: &Config,
        service: Arc<dyn GenerativeService>,
        extractor: Arc<dyn PdfExtractor>,
        lexicon: Arc<Lexicon>,
    ) -> Self {
        let mut models = vec![config.primary_model.clone()];
        models.extend(
            config
                .fallback_models
                .iter()
                .filter(|m| **m != config.primary_model)
                .cloned(),
        );
        let retry = RetryPolicy {
            max_retries: config.llm_max_retries,
            backoff_step: config.llm_backoff,
        };
        Self::new(service, extractor, lexicon, models, retry, config.max_upload_bytes)
    }

    /// The inbound operation: validate, then analyze.
    pub async fn submit(
        &self,
        submission: Submission,
        cancellation: &Cancellation,
    ) -> Result<AnalysisResponse, AppError> {
        let valid = submission.validate(self.max_upload_bytes)?;
        self.analyze(valid, cancellation).await
    }

    pub async fn analyze(
        &self,
        submission: ValidSubmission,
        cancellation: &Cancellation,
    ) -> Result<AnalysisResponse, AppError> {
        let ValidSubmission {
            job_description,
            resume,
        } = submission;

        let pages = self.extract_pages(resume).await?;
        let page_count = pages.len();
        let text = normalize(&pages.join("\n"));
        if text.is_empty() {
            warn!("No text extracted from the uploaded PDF ({page_count} pages)");
        }
        info!(
            "Extracted {} characters from {page_count} pages",
            text.chars().count()
        );

        let prompt = build_analysis_prompt(&job_description, &text);

        let local_task = {
            let lexicon = Arc::clone(&self.lexicon);
            let text = text.clone();
            let job_description = job_description.clone();
            tokio::task::spawn_blocking(move || {
                LocalAnalysis::compute(&text, &job_description, &lexicon)
            })
        };
        let (local, completion) =
            tokio::join!(local_task, self.complete_with_fallbacks(&prompt, cancellation));
        let local =
            local.map_err(|e| anyhow::anyhow!("Local analysis task failed: {e}"))?;
        let (model_used, raw_output) = completion?;

        let recovered = match recover(&raw_output) {
            Ok(recovered) => recovered,
            Err(error) => return Err(AppError::Recovery { error, raw_output }),
        };
        if recovered.stage != RecoveryStage::Direct {
            warn!(
                "Model output from {model_used} needed repair (stage {:?}, {} chars parsed)",
                recovered.stage,
                recovered.source.len()
            );
        }

        let model = ModelStructuredResult::from_map(&recovered.object);
        let Reconciled {
            report,
            heuristic_fallbacks,
        } = reconcile(model, &local);
        if !heuristic_fallbacks.is_empty() {
            info!("Filled from local heuristics: {}", heuristic_fallbacks.join(", "));
        }

        Ok(AnalysisResponse {
            analysis_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            resume_word_count: text.split_whitespace().count(),
            resume_extracted_text: text,
            page_count,
            job_description_received: job_description,
            model_used,
            local_parsing: LocalParsing {
                contact: local.contact,
                detected_skills: local.skills,
                experience_years_estimate: local.experience_years,
                achievements_count: local.achievements,
                formatting_score: local.formatting.score,
                grammar_score: local.grammar.score,
                keyword_alignment: local.alignment,
            },
            gemini_analysis: report,
            subscores_computed_locally: local.subscores,
            computed_overall_score: local.overall,
            recovery_stage: recovered.stage,
            heuristic_fallbacks,
        })
    }

    /// Runs the PDF parser on the blocking pool. The buffer is dropped when the task ends.
    async fn extract_pages(&self, resume: Bytes) -> Result<Vec<String>, AppError> {
        let extractor = Arc::clone(&self.extractor);
        let pages = tokio::task::spawn_blocking(move || extractor.extract(&resume))
            .await
            .map_err(|e| anyhow::anyhow!("PDF extraction task failed: {e}"))??;
        Ok(pages)
    }

    /// Returns `(model_used, raw_text)` from the first model that answers.
    async fn complete_with_fallbacks(
        &self,
        prompt: &str,
        cancellation: &Cancellation,
    ) -> Result<(String, String), AppError> {
        let mut failures = Vec::with_capacity(self.models.len());

        for model in &self.models {
            match call_with_retries(self.service.as_ref(), prompt, model, self.retry, cancellation)
                .await
            {
                Ok(text) => {
                    info!("Model {model} returned {} characters", text.len());
                    return Ok((model.clone(), text));
                }
                Err(LlmError::Cancelled) => {
                    info!("Analysis cancelled while waiting on {model}");
                    return Err(AppError::Cancelled);
                }
                Err(e) => {
                    warn!("Model {model} exhausted its retries: {e}");
                    failures.push(format!("{model}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            return Err(AppError::Service("no models configured".to_string()));
        }
        Err(AppError::Service(failures.join("; ")))
    }
}
