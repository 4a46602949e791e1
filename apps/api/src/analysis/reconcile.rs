//! Result Reconciler: merges the model's (possibly partial) result with local heuristics.
//!
//! "Usable" follows a falsy test: absent, null, zero scores, blank strings and empty
//! lists all count as missing and are replaced from the local analysis.

use serde_json::{Map, Value};

use crate::analysis::scoring::LocalAnalysis;
use crate::models::analysis::{AnalysisReport, ReportKeywordAlignment};

pub const FALLBACK_RECOMMENDATION: &str =
    "Consider adding more role-specific keywords and quantifying achievements with metrics.";
/// How many local skills / missing keywords stand in for strengths / gaps.
const TOP_N: usize = 5;

const SCHEMA_KEYS: [&str; 9] = [
    "overall_match_score",
    "keyword_alignment",
    "experience_relevance_score",
    "skill_strengths",
    "skill_gaps",
    "achievement_rewrites",
    "formatting_issues",
    "grammar_issues",
    "final_recommendation",
];

/// Lenient, typed view of the object the model returned. Unusable values are `None`
/// or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStructuredResult {
    pub overall_match_score: Option<u32>,
    pub keyword_alignment: Option<ReportKeywordAlignment>,
    pub experience_relevance_score: Option<u32>,
    pub skill_strengths: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub achievement_rewrites: Vec<String>,
    pub formatting_issues: Vec<String>,
    pub grammar_issues: Vec<String>,
    pub final_recommendation: Option<String>,
    pub extra: Map<String, Value>,
}

impl ModelStructuredResult {
    pub fn from_map(object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key);

        let keyword_alignment = match field("keyword_alignment") {
            Some(Value::Object(alignment)) => {
                let matched = read_list(alignment.get("matched"));
                let missing = read_list(alignment.get("missing"));
                // An alignment with nothing matched is treated as absent.
                (!matched.is_empty()).then_some(ReportKeywordAlignment { matched, missing })
            }
            _ => None,
        };

        let final_recommendation = match field("final_recommendation") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        };

        let extra = object
            .iter()
            .filter(|(key, _)| !SCHEMA_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            overall_match_score: read_score(field("overall_match_score")),
            keyword_alignment,
            experience_relevance_score: read_score(field("experience_relevance_score")),
            skill_strengths: read_list(field("skill_strengths")),
            skill_gaps: read_list(field("skill_gaps")),
            achievement_rewrites: read_list(field("achievement_rewrites")),
            formatting_issues: read_list(field("formatting_issues")),
            grammar_issues: read_list(field("grammar_issues")),
            final_recommendation,
            extra,
        }
    }
}

/// Integer, float or numeric-string score, rounded and clamped to `0..=100`.
/// Zero is unusable.
fn read_score(value: Option<&Value>) -> Option<u32> {
    let score = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim_end().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }
    let clamped = score.round().clamp(0.0, 100.0) as u32;
    (clamped > 0).then_some(clamped)
}

/// String items are kept (trimmed, non-blank), numbers and booleans are stringified,
/// anything else is dropped. A bare string counts as a one-item list.
fn read_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::String(s)) if !s.trim().is_empty() => return vec![s.trim().to_string()],
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// A reconciled report plus the names of the fields that came from local heuristics.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub report: AnalysisReport,
    pub heuristic_fallbacks: Vec<&'static str>,
}

/// Fills every unusable model field from `local`. Total: never fails.
pub fn reconcile(model: ModelStructuredResult, local: &LocalAnalysis) -> Reconciled {
    let mut fallbacks = Vec::new();

    let overall_match_score = fill(
        "overall_match_score",
        model.overall_match_score,
        &mut fallbacks,
        || local.overall,
    );
    let keyword_alignment = fill(
        "keyword_alignment",
        model.keyword_alignment,
        &mut fallbacks,
        || ReportKeywordAlignment {
            matched: local.alignment.matched.iter().cloned().collect(),
            missing: local.alignment.missing.iter().cloned().collect(),
        },
    );
    let experience_relevance_score = fill(
        "experience_relevance_score",
        model.experience_relevance_score,
        &mut fallbacks,
        || local.subscores.experience,
    );
    let skill_strengths = fill(
        "skill_strengths",
        non_empty(model.skill_strengths),
        &mut fallbacks,
        || local.skills.iter().take(TOP_N).cloned().collect(),
    );
    let skill_gaps = fill(
        "skill_gaps",
        non_empty(model.skill_gaps),
        &mut fallbacks,
        || local.alignment.missing.iter().take(TOP_N).cloned().collect(),
    );
    let formatting_issues = fill(
        "formatting_issues",
        non_empty(model.formatting_issues),
        &mut fallbacks,
        || local.formatting.issues.clone(),
    );
    let grammar_issues = fill(
        "grammar_issues",
        non_empty(model.grammar_issues),
        &mut fallbacks,
        || local.grammar.issues.clone(),
    );
    let final_recommendation = fill(
        "final_recommendation",
        model.final_recommendation,
        &mut fallbacks,
        || FALLBACK_RECOMMENDATION.to_string(),
    );

    Reconciled {
        report: AnalysisReport {
            overall_match_score,
            keyword_alignment,
            experience_relevance_score,
            skill_strengths,
            skill_gaps,
            // No local heuristic writes rewrites; an empty list is a valid value.
            achievement_rewrites: model.achievement_rewrites,
            formatting_issues,
            grammar_issues,
            final_recommendation,
            extra: model.extra,
        },
        heuristic_fallbacks: fallbacks,
    }
}

fn fill<T>(
    field: &'static str,
    value: Option<T>,
    fallbacks: &mut Vec<&'static str>,
    heuristic: impl FnOnce() -> T,
) -> T {
    match value {
        Some(value) => value,
        None => {
            fallbacks.push(field);
            heuristic()
        }
    }
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}
