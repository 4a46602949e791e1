//! Skill lexicon and impact-verb list. Shipped as JSON data and overridable at startup.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_LEXICON_JSON: &str = include_str!("../../data/lexicon.json");

/// On-disk shape of a lexicon file.
#[derive(Debug, Deserialize)]
struct LexiconFile {
    skills: Vec<String>,
    #[serde(default)]
    phrases: Vec<String>,
    #[serde(default)]
    impact_verbs: Vec<String>,
}

/// Fixed vocabulary used by the skill extractor, keyword aligner and achievement counter.
/// All entries are stored lowercase.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Single-token skills, matched against tokenized text.
    pub skills: HashSet<String>,
    /// Multi-word skills, matched as substrings of the lowercased text.
    pub phrases: Vec<String>,
    /// Verbs that signal quantified impact ("improved", "reduced", ...).
    pub impact_verbs: HashSet<String>,
}

impl Lexicon {
    /// The lexicon compiled into the binary.
    pub fn builtin() -> Self {
        // The bundled file is checked by `test_builtin_lexicon_parses`.
        Self::from_json(DEFAULT_LEXICON_JSON).unwrap_or_else(|_| Self::empty())
    }

    /// Loads from `path` when given, otherwise falls back to the built-in lexicon.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
                Self::from_json(&raw)
                    .with_context(|| format!("Invalid lexicon file {}", path.display()))
            }
            None => Ok(Self::builtin()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(raw)?;
        Ok(Self {
            skills: lowercase_set(file.skills),
            phrases: {
                let mut phrases: Vec<String> = lowercase_set(file.phrases).into_iter().collect();
                phrases.sort();
                phrases
            },
            impact_verbs: lowercase_set(file.impact_verbs),
        })
    }

    fn empty() -> Self {
        Self {
            skills: HashSet::new(),
            phrases: Vec::new(),
            impact_verbs: HashSet::new(),
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lowercase_set(items: Vec<String>) -> HashSet<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_lexicon_parses() {
        assert!(Lexicon::from_json(DEFAULT_LEXICON_JSON).is_ok());
        let lexicon = Lexicon::builtin();
        assert!(lexicon.skills.contains("python"));
        assert!(lexicon.skills.contains("c++"));
        assert!(lexicon.phrases.contains(&"machine learning".to_string()));
        assert!(lexicon.impact_verbs.contains("boosted"));
    }

    #[test]
    fn test_entries_are_lowercased_and_deduplicated() {
        let lexicon = Lexicon::from_json(
            r#"{"skills": ["Rust", "rust", " GO "], "phrases": ["Event Sourcing"], "impact_verbs": ["Cut"]}"#,
        )
        .unwrap();
        assert_eq!(lexicon.skills.len(), 2);
        assert!(lexicon.skills.contains("go"));
        assert_eq!(lexicon.phrases, vec!["event sourcing"]);
        assert!(lexicon.impact_verbs.contains("cut"));
    }

    #[test]
    fn test_missing_optional_lists_default_to_empty() {
        let lexicon = Lexicon::from_json(r#"{"skills": ["rust"]}"#).unwrap();
        assert!(lexicon.phrases.is_empty());
        assert!(lexicon.impact_verbs.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"skills": ["elixir"], "impact_verbs": ["shipped"]}}"#).unwrap();
        let lexicon = Lexicon::load(Some(file.path())).unwrap();
        assert!(lexicon.skills.contains("elixir"));
        assert!(!lexicon.skills.contains("python"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = Lexicon::load(Some(Path::new("/nonexistent/lexicon.json"))).unwrap_err();
        assert!(err.to_string().contains("lexicon"));
    }

    #[test]
    fn test_load_without_path_uses_builtin() {
        let lexicon = Lexicon::load(None).unwrap();
        assert!(lexicon.skills.contains("docker"));
    }
}
