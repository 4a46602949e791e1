//! Keyword Aligner: which job-description skills the resume covers.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::features::{extract_skills, tokenize};
use crate::analysis::lexicon::Lexicon;

/// Score used when the job description yields no keywords at all.
pub const NEUTRAL_KEYWORD_SCORE: u32 = 50;
/// Upper bound on the keywords sampled when no lexicon term is found.
const SAMPLE_SIZE: usize = 10;
const SAMPLE_MIN_CHARS: usize = 4;

/// Common words that never make useful sampled keywords.
const STOPWORDS: &[&str] = &[
    "about", "also", "and", "are", "based", "been", "being", "candidate", "experience", "from",
    "have", "into", "looking", "must", "other", "ours", "role", "should", "strong", "team",
    "that", "their", "them", "there", "they", "this", "well", "what", "when", "will", "with",
    "work", "years", "your",
];

/// Where the job-description keywords came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentConfidence {
    /// Keywords are lexicon skills found in the job description.
    Lexicon,
    /// No lexicon skill in the job description; keywords are a sample of its own words.
    /// Low confidence: the score says little about actual skill fit.
    Sampled,
    /// The job description has no usable tokens.
    NoSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAlignment {
    pub matched: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub score: u32,
    pub confidence: AlignmentConfidence,
}

/// Aligns resume skills against the job description.
///
/// `resume_skills` are lexicon skills already extracted from the resume; `resume_text`
/// is only consulted on the low-confidence sampled path.
pub fn align_keywords(
    resume_skills: &BTreeSet<String>,
    resume_text: &str,
    job_description: &str,
    lexicon: &Lexicon,
) -> KeywordAlignment {
    let jd_skills = extract_skills(job_description, lexicon);
    if !jd_skills.is_empty() {
        return score_against(&jd_skills, resume_skills, AlignmentConfidence::Lexicon);
    }

    let sample = sample_keywords(job_description);
    if sample.is_empty() {
        return KeywordAlignment {
            matched: BTreeSet::new(),
            missing: BTreeSet::new(),
            score: NEUTRAL_KEYWORD_SCORE,
            confidence: AlignmentConfidence::NoSignal,
        };
    }

    let resume_vocabulary: BTreeSet<String> = tokenize(resume_text).into_iter().collect();
    score_against(&sample, &resume_vocabulary, AlignmentConfidence::Sampled)
}

fn score_against(
    keywords: &BTreeSet<String>,
    available: &BTreeSet<String>,
    confidence: AlignmentConfidence,
) -> KeywordAlignment {
    let (matched, missing): (BTreeSet<String>, BTreeSet<String>) = keywords
        .iter()
        .cloned()
        .partition(|keyword| available.contains(keyword));

    let score = (matched.len() as f64 / keywords.len() as f64 * 100.0).round() as u32;

    KeywordAlignment {
        matched,
        missing,
        score: score.min(100),
        confidence,
    }
}

/// Deterministic stand-in for lexicon keywords: the first distinct, non-stopword,
/// alphabetic tokens of the job description, in order of appearance.
fn sample_keywords(job_description: &str) -> BTreeSet<String> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    tokenize(job_description)
        .into_iter()
        .filter(|t| t.chars().count() >= SAMPLE_MIN_CHARS)
        .filter(|t| t.chars().all(|c| c.is_alphabetic()))
        .filter(|t| !stopwords.contains(t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .take(SAMPLE_SIZE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Looking for a Python developer with AWS and Docker experience, 3+ years.";

    fn skills(text: &str) -> BTreeSet<String> {
        extract_skills(text, &Lexicon::builtin())
    }

    #[test]
    fn test_full_match_scores_100() {
        let resume = "Python, AWS, Docker, 2021–2024";
        let result = align_keywords(&skills(resume), resume, JD, &Lexicon::builtin());
        assert_eq!(result.score, 100);
        assert_eq!(result.matched.len(), 3);
        assert!(result.missing.is_empty());
        assert_eq!(result.confidence, AlignmentConfidence::Lexicon);
    }

    #[test]
    fn test_partial_match_rounds() {
        let resume = "Python only";
        let result = align_keywords(&skills(resume), resume, JD, &Lexicon::builtin());
        // 1 of 3 → 33.3 → 33
        assert_eq!(result.score, 33);
        assert!(result.matched.contains("python"));
        assert_eq!(
            result.missing.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["aws", "docker"]
        );
    }

    #[test]
    fn test_two_of_three_rounds_up() {
        let resume = "Python and Docker";
        let result = align_keywords(&skills(resume), resume, JD, &Lexicon::builtin());
        assert_eq!(result.score, 67);
    }

    #[test]
    fn test_resume_skills_not_in_jd_are_ignored() {
        let resume = "Python AWS Docker Kubernetes React";
        let result = align_keywords(&skills(resume), resume, JD, &Lexicon::builtin());
        assert_eq!(result.matched.len(), 3);
        assert!(!result.matched.contains("react"));
    }

    #[test]
    fn test_empty_job_description_is_neutral() {
        let result = align_keywords(&skills("Python"), "Python", "", &Lexicon::builtin());
        assert_eq!(result.score, NEUTRAL_KEYWORD_SCORE);
        assert_eq!(result.confidence, AlignmentConfidence::NoSignal);
        assert!(result.matched.is_empty() && result.missing.is_empty());
    }

    #[test]
    fn test_no_lexicon_terms_falls_back_to_low_confidence_sample() {
        let jd = "Seeking an accountant comfortable with payroll reconciliation and audits";
        let resume = "Certified accountant handling payroll for 40 staff";
        let result = align_keywords(&skills(resume), resume, jd, &Lexicon::builtin());
        assert_eq!(result.confidence, AlignmentConfidence::Sampled);
        assert!(result.matched.contains("accountant"));
        assert!(result.matched.contains("payroll"));
        assert!(result.missing.contains("audits"));
        assert!(result.score <= 100);
    }

    #[test]
    fn test_sample_is_bounded_and_deterministic() {
        let jd = "alpha bravo charlie delta echoes foxtrot elf hotel india juliet kilos lima mike";
        let first = sample_keywords(jd);
        assert_eq!(first.len(), SAMPLE_SIZE);
        assert_eq!(first, sample_keywords(jd));
        assert!(!first.contains("elf")); // under four characters
    }

    #[test]
    fn test_sample_skips_stopwords_and_numbers() {
        let sample = sample_keywords("Looking for 2024 experience with ledgers");
        assert_eq!(sample.into_iter().collect::<Vec<_>>(), vec!["ledgers"]);
    }
}
