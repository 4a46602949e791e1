// Prompt constants for resume analysis.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Schema the model is asked to fill. Field names match `ModelStructuredResult`.
pub const ANALYSIS_SCHEMA_PROMPT: &str = "\
You are an expert ATS resume analyzer that must return EXACTLY one valid JSON object (no explanation).
Given a Job Description and a Resume, return a JSON object that contains the following keys:
- overall_match_score: integer 0-100
- keyword_alignment: { matched: [strings], missing: [strings] }
- experience_relevance_score: integer 0-100
- skill_strengths: list of 3-5 short strings (bullets)
- skill_gaps: list of 3-5 short strings
- achievement_rewrites: list of up to 5 suggested rewritten bullet points (concise)
- formatting_issues: list of formatting problems (strings)
- grammar_issues: list of grammar/style issues (strings)
- final_recommendation: short 1-2 sentence recommendation";

/// Builds the full analysis prompt: schema, job description, cleaned resume text.
pub fn build_analysis_prompt(job_description: &str, resume_text: &str) -> String {
    format!(
        "{ANALYSIS_SCHEMA_PROMPT}\n\n{JSON_ONLY_INSTRUCTION}\n\n\
         ---Job Description---\n{job_description}\n\n\
         ---Resume Text---\n{resume_text}\n\n\
         Return only JSON."
    )
}
