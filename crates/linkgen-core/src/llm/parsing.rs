//! Tolerant extraction of structured output from raw LLM text.
//!
//! LLMs routinely wrap JSON in markdown code fences even when asked not to.
//! This module strips those fences before decoding, mirroring the
//! fence-stripping step the content generator used to rely on.

use serde::Deserialize;

use crate::error::LlmError;

/// Strip a leading/trailing ``` fence (optionally tagged, e.g. ```json```)
/// from raw LLM output. Text without fences is returned unchanged, trimmed.
pub fn strip_markdown_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = body.trim_start_matches(|c: char| c.is_alphanumeric());
    body.trim().to_string()
}

/// The typed shape produced by `GenerateIdeas`.
#[derive(Debug, Deserialize)]
pub struct IdeasResponse {
    #[serde(default)]
    pub ideas: Vec<String>,
}

/// The typed shape produced by `GenerateDrafts`.
#[derive(Debug, Deserialize)]
pub struct DraftsResponse {
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub articles: Vec<String>,
}

/// Strip fences then JSON-decode into an `IdeasResponse`, enforcing a
/// minimum populated cardinality of 1.
pub fn parse_ideas_response(raw: &str) -> Result<IdeasResponse, LlmError> {
    let stripped = strip_markdown_fences(raw);
    let parsed: IdeasResponse =
        serde_json::from_str(&stripped).map_err(|e| LlmError::ResponseError {
            stage: "ideas_validation".to_string(),
            prompt: String::new(),
            raw_response: raw.to_string(),
            detail: e.to_string(),
        })?;
    if parsed.ideas.is_empty() {
        return Err(LlmError::ResponseError {
            stage: "ideas_validation".to_string(),
            prompt: String::new(),
            raw_response: raw.to_string(),
            detail: "response contained zero ideas".to_string(),
        });
    }
    Ok(parsed)
}

/// Strip fences then JSON-decode into a `DraftsResponse`, enforcing
/// `posts >= 5, articles >= 1` per the draft-generation contract.
pub fn parse_drafts_response(raw: &str) -> Result<DraftsResponse, LlmError> {
    let stripped = strip_markdown_fences(raw);
    let parsed: DraftsResponse =
        serde_json::from_str(&stripped).map_err(|e| LlmError::ResponseError {
            stage: "drafts_validation".to_string(),
            prompt: String::new(),
            raw_response: raw.to_string(),
            detail: e.to_string(),
        })?;
    if parsed.posts.len() < 5 || parsed.articles.is_empty() {
        return Err(LlmError::ResponseError {
            stage: "drafts_validation".to_string(),
            prompt: String::new(),
            raw_response: raw.to_string(),
            detail: format!(
                "expected >=5 posts and >=1 article, got {} posts and {} articles",
                parsed.posts.len(),
                parsed.articles.len()
            ),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_tagged_fence() {
        let raw = "```json\n{\"ideas\":[\"a\"]}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"ideas\":[\"a\"]}");
    }

    #[test]
    fn strips_untagged_fence() {
        let raw = "```\n{\"ideas\":[\"a\"]}\n```";
        assert_eq!(strip_markdown_fences(raw), "{\"ideas\":[\"a\"]}");
    }

    #[test]
    fn passes_through_unfenced_text() {
        let raw = "  {\"ideas\":[\"a\"]}  ";
        assert_eq!(strip_markdown_fences(raw), "{\"ideas\":[\"a\"]}");
    }

    #[test]
    fn parses_fenced_ideas_response() {
        let raw = "```json\n{\"ideas\":[\"a\",\"b\",\"c\",\"d\",\"e\"]}\n```";
        let parsed = parse_ideas_response(raw).unwrap();
        assert_eq!(parsed.ideas.len(), 5);
    }

    #[test]
    fn rejects_empty_ideas() {
        let raw = "{\"ideas\":[]}";
        assert!(parse_ideas_response(raw).is_err());
    }

    #[test]
    fn parses_fenced_drafts_response() {
        let raw = "```json\n{\"posts\":[\"p1\",\"p2\",\"p3\",\"p4\",\"p5\"],\"articles\":[\"# Title\\n\\nBody\"]}\n```";
        let parsed = parse_drafts_response(raw).unwrap();
        assert_eq!(parsed.posts.len(), 5);
        assert_eq!(parsed.articles.len(), 1);
    }

    #[test]
    fn rejects_too_few_posts() {
        let raw = "{\"posts\":[\"p1\"],\"articles\":[\"a\"]}";
        assert!(parse_drafts_response(raw).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let raw = "not json at all";
        assert!(parse_ideas_response(raw).is_err());
    }
}
