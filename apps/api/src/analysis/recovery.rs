//! Model Response Recoverer: pulls a JSON object out of free-text model output.
//!
//! The model is asked for bare JSON but regularly wraps it in prose or code fences,
//! uses single quotes, or leaves trailing commas. Recovery locates the first balanced
//! object, then runs a fixed chain of repairs, parsing after each one. The first
//! successful parse wins. Every stage is a pure `&str -> String` function.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Characters of the failing candidate kept for diagnostics.
pub const EXCERPT_CHARS: usize = 1000;

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```[a-z0-9_-]*\s*").unwrap());
static TRAILING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```$").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
/// Brace blocks with at most one level of nesting.
static INNER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").unwrap());

#[derive(Debug, Clone, Error)]
pub enum RecoveryError {
    #[error("No JSON object found in model output")]
    NoObject { excerpt: String },

    #[error("Failed to parse JSON from model output. Candidate excerpt: {excerpt}")]
    Unparseable { excerpt: String },
}

impl RecoveryError {
    /// Up to `EXCERPT_CHARS` characters of the text recovery gave up on.
    pub fn excerpt(&self) -> &str {
        match self {
            RecoveryError::NoObject { excerpt } | RecoveryError::Unparseable { excerpt } => excerpt,
        }
    }
}

/// Which stage of the chain produced the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    Direct,
    QuotesNormalized,
    TrailingCommasStripped,
    InnerBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub object: Map<String, Value>,
    pub stage: RecoveryStage,
    /// The exact text that parsed.
    pub source: String,
}

type Repair = fn(&str) -> String;

/// Applied in order, each to the previous stage's output.
const REPAIR_CHAIN: &[(RecoveryStage, Repair)] = &[
    (RecoveryStage::Direct, unchanged),
    (RecoveryStage::QuotesNormalized, normalize_quotes),
    (RecoveryStage::TrailingCommasStripped, strip_trailing_commas),
];

/// Recovers the first JSON object embedded in `raw`.
pub fn recover(raw: &str) -> Result<Recovered, RecoveryError> {
    let unfenced = strip_code_fences(raw);
    let candidate = locate_object(&unfenced).ok_or_else(|| RecoveryError::NoObject {
        excerpt: truncate_chars(&unfenced, EXCERPT_CHARS),
    })?;

    let mut current = candidate.to_string();
    for (stage, repair) in REPAIR_CHAIN {
        current = repair(&current);
        if let Some(object) = parse_object(&current) {
            debug!("Recovered model output at stage {stage:?}");
            return Ok(Recovered {
                object,
                stage: *stage,
                source: current,
            });
        }
    }

    for block in INNER_BLOCK.find_iter(&current) {
        if let Some(object) = parse_object(block.as_str()) {
            debug!("Recovered model output from an inner block");
            return Ok(Recovered {
                object,
                stage: RecoveryStage::InnerBlock,
                source: block.as_str().to_string(),
            });
        }
    }

    Err(RecoveryError::Unparseable {
        excerpt: truncate_chars(&current, EXCERPT_CHARS),
    })
}

/// Removes a leading ```` ```lang ```` fence and a trailing ```` ``` ```` fence.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_lead = LEADING_FENCE.replace(trimmed, "");
    TRAILING_FENCE.replace(&without_lead, "").into_owned()
}

/// Returns the first balanced `{...}` in `text`. Braces inside double-quoted strings
/// are skipped. If the object never closes, runs to the last `}` (or the end).
pub fn locate_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

fn unchanged(candidate: &str) -> String {
    candidate.to_string()
}

/// Single quotes (unless escaped) and curly double quotes become plain double quotes.
pub fn normalize_quotes(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut previous: Option<char> = None;
    for ch in candidate.chars() {
        match ch {
            '\'' if previous != Some('\\') => out.push('"'),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            _ => out.push(ch),
        }
        previous = Some(ch);
    }
    out
}

/// Drops commas that directly precede a closing `}` or `]`.
pub fn strip_trailing_commas(candidate: &str) -> String {
    TRAILING_COMMA.replace_all(candidate, "$1").into_owned()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
