//! Score Aggregator: five sub-scores combined with a fixed weight table.
//!
//! Weights are held as integer percentages so the "sums to exactly 1.0" invariant
//! is checked at compile time and never drifts through float rounding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::features::{
    assess_formatting, assess_grammar, count_achievements, estimate_experience_years,
    extract_contact_info, extract_skills, ContactInfo, FormattingAssessment, GrammarAssessment,
};
use crate::analysis::keywords::{align_keywords, KeywordAlignment};
use crate::analysis::lexicon::Lexicon;

/// Sub-score weights in percent: keyword, experience, achievements, formatting, grammar.
pub const WEIGHT_PERCENTS: [u32; 5] = [45, 20, 15, 10, 10];

const _: () = assert!(
    WEIGHT_PERCENTS[0]
        + WEIGHT_PERCENTS[1]
        + WEIGHT_PERCENTS[2]
        + WEIGHT_PERCENTS[3]
        + WEIGHT_PERCENTS[4]
        == 100
);

/// Used when no experience signal was found: absence is not penalised.
const NEUTRAL_EXPERIENCE_SCORE: u32 = 50;
const POINTS_PER_EXPERIENCE_YEAR: f64 = 10.0;
const POINTS_PER_ACHIEVEMENT: u32 = 25;

/// The five component scores, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub keyword: u32,
    pub experience: u32,
    pub achievements: u32,
    pub formatting: u32,
    pub grammar: u32,
}

impl SubScores {
    /// Builds sub-scores, clamping every component into `0..=100`.
    pub fn new(keyword: u32, experience: u32, achievements: u32, formatting: u32, grammar: u32) -> Self {
        Self {
            keyword: keyword.min(100),
            experience: experience.min(100),
            achievements: achievements.min(100),
            formatting: formatting.min(100),
            grammar: grammar.min(100),
        }
    }

    fn as_array(&self) -> [u32; 5] {
        [
            self.keyword,
            self.experience,
            self.achievements,
            self.formatting,
            self.grammar,
        ]
    }
}

/// Weight of each sub-score as a fraction (keyword, experience, achievements, formatting, grammar).
pub fn weights() -> [f64; 5] {
    WEIGHT_PERCENTS.map(|w| f64::from(w) / 100.0)
}

/// Weighted sum of the sub-scores, rounded half-up and clamped to `0..=100`.
pub fn aggregate(scores: &SubScores) -> u32 {
    let weighted: u32 = scores
        .as_array()
        .iter()
        .zip(WEIGHT_PERCENTS)
        .map(|(&score, weight)| score.min(100) * weight)
        .sum();
    ((weighted + 50) / 100).min(100)
}

/// `min(100, years × 10)`, or neutral when there is no experience signal.
pub fn experience_score(years: f64) -> u32 {
    if years > 0.0 {
        (years * POINTS_PER_EXPERIENCE_YEAR).round().min(100.0) as u32
    } else {
        NEUTRAL_EXPERIENCE_SCORE
    }
}

pub fn achievements_score(count: u32) -> u32 {
    count.saturating_mul(POINTS_PER_ACHIEVEMENT).min(100)
}

// ────────────────────────────────────────────────────────────────────────────
// Local heuristic analysis
// ────────────────────────────────────────────────────────────────────────────

/// Everything computed locally for one resume/job-description pair.
#[derive(Debug, Clone)]
pub struct LocalAnalysis {
    pub contact: ContactInfo,
    pub skills: BTreeSet<String>,
    pub experience_years: f64,
    pub achievements: u32,
    pub formatting: FormattingAssessment,
    pub grammar: GrammarAssessment,
    pub alignment: KeywordAlignment,
    pub subscores: SubScores,
    pub overall: u32,
}

impl LocalAnalysis {
    /// Runs every extractor, the aligner and the aggregator. Pure and infallible.
    pub fn compute(resume_text: &str, job_description: &str, lexicon: &Lexicon) -> Self {
        let contact = extract_contact_info(resume_text);
        let skills = extract_skills(resume_text, lexicon);
        let experience_years = estimate_experience_years(resume_text);
        let achievements = count_achievements(resume_text, lexicon);
        let formatting = assess_formatting(resume_text);
        let grammar = assess_grammar(resume_text);
        let alignment = align_keywords(&skills, resume_text, job_description, lexicon);

        let subscores = SubScores::new(
            alignment.score,
            experience_score(experience_years),
            achievements_score(achievements),
            formatting.score,
            grammar.score,
        );
        let overall = aggregate(&subscores);

        Self {
            contact,
            skills,
            experience_years,
            achievements,
            formatting,
            grammar,
            alignment,
            subscores,
            overall,
        }
    }
}
