//! AI summarizer client (Gemini generateContent endpoint).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SolmapError};

/// Environment variable holding the summarizer API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for generating the markdown solution summary.
pub struct SummaryClient {
    client: Client,
    api_key: String,
    model: String,
}

impl SummaryClient {
    /// Build a client with the default model.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation)
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Client from the environment, or `None` when no key is configured.
    pub fn from_env() -> Option<Self> {
        std::env::var(GEMINI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }

    /// Generate a summary for the prompt, with code fences stripped.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SolmapError::Api(format!(
                "Summary API returned HTTP {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SolmapError::Api("Summary API returned no text".to_string()));
        }
        Ok(strip_code_fences(&text))
    }
}

/// Remove a wrapping markdown code fence from a model response.
pub fn strip_code_fences(text: &str) -> String {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```markdown") {
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("# Plain"), "# Plain");
        assert_eq!(strip_code_fences("```markdown\n# Title\n```"), "# Title");
        assert_eq!(strip_code_fences("```\n# Title\n```"), "# Title");
        assert_eq!(strip_code_fences("  # Padded  "), "# Padded");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r##"{
            "candidates": [
                {"content": {"parts": [{"text": "# Summary"}, {"text": " body"}]}}
            ]
        }"##;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "# Summary body");
    }

    #[test]
    fn test_response_parsing_empty() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
