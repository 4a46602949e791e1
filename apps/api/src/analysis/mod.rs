// Resume Analysis Pipeline
// Implements: text normalization, heuristic features, keyword alignment, scoring,
// model output recovery and reconciliation.
// Model calls go through llm_client; PDF parsing goes through extraction.

pub mod features;
pub mod handlers;
pub mod keywords;
pub mod lexicon;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod reconcile;
pub mod recovery;
pub mod scoring;
