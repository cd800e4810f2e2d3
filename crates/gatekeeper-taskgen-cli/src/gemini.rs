// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use gatekeeper_taskgen_core::{GenerationError, GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};

pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` over blocking HTTP.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::NotConfigured(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, request.model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part {
                    text: request.prompt,
                }],
            }],
        };
        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let payload: GenerateResponse = resp
            .json()
            .map_err(|e| GenerationError::Malformed(e.without_url().to_string()))?;
        payload.text().ok_or(GenerationError::Empty)
    }
}
