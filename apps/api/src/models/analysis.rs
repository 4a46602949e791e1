use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::analysis::features::ContactInfo;
use crate::analysis::keywords::KeywordAlignment;
use crate::analysis::recovery::RecoveryStage;
use crate::analysis::scoring::SubScores;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportKeywordAlignment {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// The merged match report. Every field is always populated after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overall_match_score: u32,
    pub keyword_alignment: ReportKeywordAlignment,
    pub experience_relevance_score: u32,
    pub skill_strengths: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub achievement_rewrites: Vec<String>,
    pub formatting_issues: Vec<String>,
    pub grammar_issues: Vec<String>,
    pub final_recommendation: String,
    /// Keys the model returned outside the schema, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Local heuristic diagnostics echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct LocalParsing {
    pub contact: ContactInfo,
    pub detected_skills: BTreeSet<String>,
    pub experience_years_estimate: f64,
    pub achievements_count: u32,
    pub formatting_score: u32,
    pub grammar_score: u32,
    pub keyword_alignment: KeywordAlignment,
}

/// Response body of `POST /analyze-job`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub resume_extracted_text: String,
    pub resume_word_count: usize,
    pub page_count: usize,
    pub job_description_received: String,
    pub model_used: String,
    pub local_parsing: LocalParsing,
    pub gemini_analysis: AnalysisReport,
    pub subscores_computed_locally: SubScores,
    pub computed_overall_score: u32,
    pub recovery_stage: RecoveryStage,
    pub heuristic_fallbacks: Vec<&'static str>,
}
