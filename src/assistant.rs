//! AI assistant client
//!
//! Sends prompts to the Gemini `generateContent` API and extracts the first
//! candidate's text. Each query is a single attempt: a failure is reported
//! to the user and never retried automatically.

use crate::error::AssistantError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use zeroize::Zeroize;

/// Gemini generateContent endpoint (API key appended as a query parameter)
const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Client for the Gemini generateContent API
pub(crate) struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Response from generateContent
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub(crate) fn new(api_key: String) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { api_key, client })
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable
    pub(crate) fn from_env() -> Result<Self, AssistantError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| AssistantError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Ask the assistant a question, returning the answer text
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub(crate) async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let url = format!("{}?key={}", GEMINI_API_URL, self.api_key);
        let response = self.client.post(&url).json(&request_body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::ServerError { status, message });
        }

        let generate_response: GenerateResponse = response.json().await.map_err(|e| {
            AssistantError::InvalidResponse(format!("Failed to parse assistant response: {}", e))
        })?;

        let answer = Self::extract_text(&generate_response)?;
        info!(answer_len = answer.len(), "Assistant query succeeded");
        Ok(answer)
    }

    /// Extract the first candidate's text from the response structure
    fn extract_text(response: &GenerateResponse) -> Result<String, AssistantError> {
        response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                AssistantError::InvalidResponse("No text content in assistant response".into())
            })
    }
}

impl Drop for GeminiClient {
    fn drop(&mut self) {
        // Clear API key from memory
        self.api_key.zeroize();
    }
}
