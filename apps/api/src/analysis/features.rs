//! Feature Extractors: deterministic heuristics over normalized resume text.
//!
//! Every extractor is total: malformed or empty input yields a safe default
//! (empty string/set, zero, neutral score) instead of an error.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::lexicon::Lexicon;

/// Only the top of the document is searched for the candidate's name.
const NAME_SEARCH_LINES: usize = 6;
const NAME_MAX_TOKENS: usize = 5;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\-\s\(\)]{7,}\d").unwrap());
/// Word-like chunks of lowercased text: alphanumerics plus `+ # - _`, at least 2 long.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9+#_\-]{2,}").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static YEARS_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\+?\s*years?\b").unwrap());
static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d+%|\b\d+\s?percent\b").unwrap());
/// Residual letter-spacing: three or more "X " capital-letter tokens in a row.
static LETTER_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\b[A-Z]\s){3,}").unwrap());
static SYMBOL_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]{6,}").unwrap());
static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Contact info
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Best-effort contact extraction. Email and phone: first match anywhere.
/// Name: first of the leading non-empty lines with at most five tokens, no digit and no `@`.
pub fn extract_contact_info(text: &str) -> ContactInfo {
    let name = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(NAME_SEARCH_LINES)
        .find(|line| {
            !line.contains('@')
                && !line.chars().any(|c| c.is_ascii_digit())
                && line.split_whitespace().count() <= NAME_MAX_TOKENS
        })
        .unwrap_or_default()
        .to_string();

    ContactInfo {
        name,
        email: EMAIL
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        phone: PHONE
            .find(text)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// Lowercase word-like tokens of `text`, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lexicon skills found in `text`: multi-word phrases by substring, single skills by token.
/// Sorted and deduplicated.
pub fn extract_skills(text: &str, lexicon: &Lexicon) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut found: BTreeSet<String> = lexicon
        .phrases
        .iter()
        .filter(|phrase| lower.contains(phrase.as_str()))
        .cloned()
        .collect();

    for token in TOKEN.find_iter(&lower) {
        if lexicon.skills.contains(token.as_str()) {
            found.insert(token.as_str().to_string());
        }
    }
    found
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

/// Years of experience, estimated as the span between the earliest and latest year
/// mentioned. Falls back to an explicit "N years" mention, then to zero.
///
/// This is a crude proxy: certification or graduation dates widen the span.
pub fn estimate_experience_years(text: &str) -> f64 {
    let years: HashSet<u32> = YEAR
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    if years.len() >= 2 {
        let min = years.iter().min().copied().unwrap_or_default();
        let max = years.iter().max().copied().unwrap_or_default();
        return f64::from(max - min);
    }

    YEARS_MENTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(f64::from)
        .unwrap_or(0.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Achievements
// ────────────────────────────────────────────────────────────────────────────

/// Percentage mentions plus impact-verb occurrences.
pub fn count_achievements(text: &str, lexicon: &Lexicon) -> u32 {
    let percentages = PERCENTAGE.find_iter(text).count();
    let verbs = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .filter(|word| lexicon.impact_verbs.contains(&word.to_lowercase()))
        .count();
    u32::try_from(percentages + verbs).unwrap_or(u32::MAX)
}

// ────────────────────────────────────────────────────────────────────────────
// Formatting risk
// ────────────────────────────────────────────────────────────────────────────

/// Formatting score (higher = safer for ATS parsing) and the penalties that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingAssessment {
    pub score: u32,
    pub issues: Vec<String>,
}

const LETTER_SPACING_PENALTY: i32 = 30;
const MULTI_COLUMN_PENALTY: i32 = 25;
const SYMBOL_RUN_PENALTY: i32 = 20;
const SHORT_LINE_CHARS: usize = 40;
const SHORT_LINE_RATIO: f64 = 0.45;
const MULTI_COLUMN_MIN_LINES: usize = 10;

pub fn assess_formatting(text: &str) -> FormattingAssessment {
    let mut score: i32 = 100;
    let mut issues = Vec::new();

    if LETTER_SPACING.is_match(text) {
        score -= LETTER_SPACING_PENALTY;
        issues.push(
            "Letter-spaced text detected (e.g. \"N A M E\"); ATS parsers read it as separate letters"
                .to_string(),
        );
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let short = lines
        .iter()
        .filter(|l| l.chars().count() < SHORT_LINE_CHARS)
        .count();
    if lines.len() > MULTI_COLUMN_MIN_LINES
        && short as f64 / lines.len() as f64 > SHORT_LINE_RATIO
    {
        score -= MULTI_COLUMN_PENALTY;
        issues.push(
            "Many short lines suggest a multi-column layout; use a single-column format"
                .to_string(),
        );
    }

    if SYMBOL_RUN.is_match(text) {
        score -= SYMBOL_RUN_PENALTY;
        issues.push("Long runs of symbols or decorative characters".to_string());
    }

    FormattingAssessment {
        score: score.clamp(0, 100) as u32,
        issues,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grammar / readability
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarAssessment {
    pub score: u32,
    pub mean_sentence_words: f64,
    pub fragments: u32,
    pub issues: Vec<String>,
}

const NEUTRAL_GRAMMAR_SCORE: u32 = 50;
const READABLE_MIN_WORDS: f64 = 8.0;
const READABLE_MAX_WORDS: f64 = 30.0;
const FRAGMENT_MAX_WORDS: usize = 3;
const FRAGMENT_PENALTY_CAP: u32 = 20;

pub fn assess_grammar(text: &str) -> GrammarAssessment {
    let sentences: Vec<usize> = SENTENCE_BREAK
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.split_whitespace().count())
        .collect();

    if sentences.is_empty() {
        return GrammarAssessment {
            score: NEUTRAL_GRAMMAR_SCORE,
            mean_sentence_words: 0.0,
            fragments: 0,
            issues: Vec::new(),
        };
    }

    let mean = sentences.iter().sum::<usize>() as f64 / sentences.len() as f64;
    let fragments = sentences.iter().filter(|&&w| w < FRAGMENT_MAX_WORDS).count() as u32;

    let mut issues = Vec::new();
    let base: i64 = if (READABLE_MIN_WORDS..=READABLE_MAX_WORDS).contains(&mean) {
        85
    } else {
        issues.push(format!(
            "Average sentence length is {mean:.1} words; aim for {READABLE_MIN_WORDS}-{READABLE_MAX_WORDS}"
        ));
        60
    };
    if fragments > 0 {
        issues.push(format!(
            "{fragments} sentence fragment(s) under {FRAGMENT_MAX_WORDS} words"
        ));
    }

    let score = base - i64::from(fragments.min(FRAGMENT_PENALTY_CAP));
    GrammarAssessment {
        score: score.clamp(0, 100) as u32,
        mean_sentence_words: mean,
        fragments,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe
jane.doe@example.com | +1 (555) 123-4567
Senior Software Engineer

Experience
Acme Corp 2018 - 2024
Improved API latency by 35% and reduced cloud spend by 20 percent.
Built Python services on AWS with Docker and Kubernetes, applying machine learning models.";

    #[test]
    fn test_contact_extraction() {
        let contact = extract_contact_info(RESUME);
        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.email, "jane.doe@example.com");
        assert_eq!(contact.phone, "+1 (555) 123-4567");
    }

    #[test]
    fn test_name_skips_lines_with_digits_or_email() {
        let text = "jane@example.com\n2024 Resume\nJane Doe";
        assert_eq!(extract_contact_info(text).name, "Jane Doe");
    }

    #[test]
    fn test_name_only_searched_in_first_six_non_empty_lines() {
        let text = "1\n\n2\n3\n4\n5\n6\nJane Doe";
        assert_eq!(extract_contact_info(text).name, "");
    }

    #[test]
    fn test_contact_empty_input() {
        assert_eq!(extract_contact_info(""), ContactInfo::default());
    }

    #[test]
    fn test_skills_include_phrases_and_tokens_sorted() {
        let skills = extract_skills(RESUME, &Lexicon::builtin());
        let skills: Vec<&str> = skills.iter().map(String::as_str).collect();
        assert_eq!(
            skills,
            vec!["aws", "docker", "kubernetes", "machine learning", "python"]
        );
    }

    #[test]
    fn test_skills_match_symbol_tokens() {
        let skills = extract_skills("Modern C++ and SQL", &Lexicon::builtin());
        assert!(skills.contains("c++"));
        assert!(skills.contains("sql"));
    }

    #[test]
    fn test_skills_empty_input() {
        assert!(extract_skills("", &Lexicon::builtin()).is_empty());
    }

    #[test]
    fn test_experience_from_year_span() {
        assert_eq!(estimate_experience_years("Python, AWS, Docker, 2021–2024"), 3.0);
        assert_eq!(estimate_experience_years(RESUME), 6.0);
    }

    #[test]
    fn test_experience_from_years_mention() {
        assert_eq!(estimate_experience_years("Over 7 years building systems"), 7.0);
        assert_eq!(estimate_experience_years("5+ years of Rust"), 5.0);
    }

    #[test]
    fn test_experience_single_year_without_mention_is_zero() {
        assert_eq!(estimate_experience_years("Graduated 2020"), 0.0);
        assert_eq!(estimate_experience_years(""), 0.0);
    }

    #[test]
    fn test_experience_ignores_non_year_numbers() {
        assert_eq!(estimate_experience_years("Handled 1500 and 3000 requests"), 0.0);
    }

    #[test]
    fn test_achievements_count_percentages_and_verbs() {
        // 35%, 20 percent, improved, reduced
        assert_eq!(count_achievements(RESUME, &Lexicon::builtin()), 4);
    }

    #[test]
    fn test_achievement_verbs_are_whole_words() {
        assert_eq!(count_achievements("unimproved savedata", &Lexicon::builtin()), 0);
        assert_eq!(count_achievements("Boosted revenue", &Lexicon::builtin()), 1);
    }

    #[test]
    fn test_formatting_clean_text_scores_full() {
        let assessment = assess_formatting(RESUME);
        assert_eq!(assessment.score, 100);
        assert!(assessment.issues.is_empty());
    }

    #[test]
    fn test_formatting_letter_spacing_penalty() {
        let assessment = assess_formatting("J O H N resume");
        assert_eq!(assessment.score, 70);
        assert_eq!(assessment.issues.len(), 1);
    }

    #[test]
    fn test_formatting_multi_column_penalty() {
        let text = (0..12).map(|i| format!("short {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(assess_formatting(&text).score, 75);
    }

    #[test]
    fn test_formatting_ten_short_lines_not_penalised() {
        let text = (0..10).map(|i| format!("short {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(assess_formatting(&text).score, 100);
    }

    #[test]
    fn test_formatting_all_penalties_stay_in_range() {
        let mut text = (0..12).map(|_| "A B C D").collect::<Vec<_>>().join("\n");
        text.push_str("\n*#*#*#*#");
        let assessment = assess_formatting(&text);
        assert_eq!(assessment.score, 25);
        assert_eq!(assessment.issues.len(), 3);
    }

    #[test]
    fn test_grammar_empty_is_neutral() {
        assert_eq!(assess_grammar("").score, 50);
        assert_eq!(assess_grammar("   ").score, 50);
    }

    #[test]
    fn test_grammar_readable_sentences_score_85() {
        let text = "I designed and shipped a billing platform used by many teams. \
                    The platform processed millions of invoices every single month.";
        let assessment = assess_grammar(text);
        assert_eq!(assessment.score, 85);
        assert_eq!(assessment.fragments, 0);
    }

    #[test]
    fn test_grammar_fragments_penalised() {
        // Mean is below 8 words and every sentence is a fragment.
        let assessment = assess_grammar("Python. AWS. Docker.");
        assert_eq!(assessment.fragments, 3);
        assert_eq!(assessment.score, 57);
        assert_eq!(assessment.issues.len(), 2);
    }

    #[test]
    fn test_grammar_fragment_penalty_capped() {
        let text = vec!["Go."; 40].join(" ");
        assert_eq!(assess_grammar(&text).score, 40);
    }
}
