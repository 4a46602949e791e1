//! Text Normalizer: cleans raw PDF text before any heuristic looks at it.
//!
//! Three passes, in order: spaced-letter rejoin, de-hyphenation, whitespace collapse.
//! The three passes are repeated until the text stops changing, which makes
//! `normalize` idempotent even when one pass exposes new work for an earlier one
//! (e.g. collapsing a double space brings two single letters next to each other).

use std::sync::LazyLock;

use regex::Regex;

/// Each pass only ever shortens the text, so this is never reached in practice.
const MAX_PASSES: usize = 16;

const SOFT_HYPHEN: char = '\u{00AD}';

/// Two or more whitespace characters separate letter-spaced words ("N U K  V I S").
static GROUP_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
/// A hyphen at the end of a line, with any horizontal whitespace around the break.
static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[^\S\n]*\n[^\S\n]*").unwrap());
static HORIZONTAL_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleans raw extracted text. Never fails; malformed input degrades to a best-effort string.
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_pass(raw);
    for _ in 0..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(text: &str) -> String {
    collapse_whitespace(&fix_hyphenation(&rejoin_spaced_letters(text)))
}

// ────────────────────────────────────────────────────────────────────────────
// Pass 1: spaced-letter rejoin
// ────────────────────────────────────────────────────────────────────────────

/// Converts letter-spaced headings ("N U K A L A  V I S H A L") into words ("NUKALA VISHAL").
pub fn rejoin_spaced_letters(text: &str) -> String {
    text.split('\n')
        .map(rejoin_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_single_char_token(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphanumeric())
}

fn rejoin_line(line: &str) -> String {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return line.to_string();
    }

    let singles = tokens.iter().filter(|t| is_single_char_token(t)).count();
    let threshold = (tokens.len() as f64 * 0.5).max(2.0);
    if (singles as f64) < threshold {
        return line.to_string();
    }

    let mut words: Vec<String> = Vec::with_capacity(tokens.len());
    for group in GROUP_GAP.split(line.trim()) {
        let mut buffer = String::new();
        for token in group.split_whitespace() {
            if is_single_char_token(token) {
                buffer.push_str(token);
            } else {
                if !buffer.is_empty() {
                    words.push(std::mem::take(&mut buffer));
                }
                words.push(token.to_string());
            }
        }
        if !buffer.is_empty() {
            words.push(buffer);
        }
    }
    words.join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Pass 2: de-hyphenation
// ────────────────────────────────────────────────────────────────────────────

/// Joins words split with a hyphen across a line break and strips soft hyphens.
pub fn fix_hyphenation(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    HYPHEN_BREAK
        .replace_all(&text, "")
        .chars()
        .filter(|&c| c != SOFT_HYPHEN)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Pass 3: whitespace collapse
// ────────────────────────────────────────────────────────────────────────────

/// Normalises line endings, collapses horizontal runs to one space and blank-line
/// runs to a single blank line, then trims the document.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_RUN.replace_all(&text, " ");
    let text = text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n");
    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY_INPUTS: &[&str] = &[
        "",
        "   \n\n  ",
        "N U K A L A  V I S H A L",
        "x  y",
        "a  b  c  d",
        "I am a developer",
        "multi-\ntenant platform",
        "multi-  \r\n  tenant",
        "soft\u{00AD}hyphen",
        "line one\n\n\n\n\nline two",
        "tabs\t\tand   spaces",
        "J O H N  D O E\nSoftware Engineer\n\n\nP Y T H O N | A W S",
        "- \n- \n-",
        "A B-\nC D",
        "\r\r\n\r",
        "2021 – 2024 • Built C++ services",
    ];

    #[test]
    fn test_letter_spaced_name_is_rejoined() {
        assert_eq!(normalize("N U K A L A  V I S H A L"), "NUKALA VISHAL");
    }

    #[test]
    fn test_ordinary_sentence_is_untouched() {
        assert_eq!(normalize("I am a developer"), "I am a developer");
    }

    #[test]
    fn test_mixed_line_keeps_other_tokens() {
        assert_eq!(rejoin_line("P Y T H O N | A W S"), "PYTHON | AWS");
    }

    #[test]
    fn test_line_below_threshold_is_unchanged() {
        let line = "Built a system with 5 engineers and many services";
        assert_eq!(rejoin_line(line), line);
    }

    #[test]
    fn test_hyphen_at_line_end_joins_words() {
        assert_eq!(normalize("devel-\nopment work"), "development work");
        assert_eq!(normalize("multi-  \r\n  tenant"), "multitenant");
    }

    #[test]
    fn test_inline_hyphen_is_kept() {
        assert_eq!(normalize("multi-tenant"), "multi-tenant");
    }

    #[test]
    fn test_soft_hyphen_removed() {
        assert_eq!(normalize("soft\u{00AD}hyphen"), "softhyphen");
    }

    #[test]
    fn test_blank_line_runs_collapse_to_one() {
        assert_eq!(normalize("line one\n\n\n\n\nline two"), "line one\n\nline two");
        assert_eq!(normalize("a\n  \n \t \nb"), "a\n\nb");
    }

    #[test]
    fn test_horizontal_whitespace_collapses() {
        assert_eq!(normalize("tabs\t\tand   spaces"), "tabs and spaces");
    }

    #[test]
    fn test_crlf_normalised() {
        assert_eq!(normalize("one\r\ntwo\rthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n\n\t"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in TRICKY_INPUTS {
            let once = normalize(input);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_output_has_no_soft_hyphen_or_blank_runs() {
        for input in TRICKY_INPUTS {
            let out = normalize(input);
            assert!(!out.contains(SOFT_HYPHEN));
            assert!(!out.contains("\n\n\n"), "blank run left in {out:?}");
        }
    }
}
