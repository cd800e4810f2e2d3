// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("text generation is not configured: {0}")]
    NotConfigured(String),
    #[error("text generation request failed: {0}")]
    Transport(String),
    #[error("text generation returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed text generation response: {0}")]
    Malformed(String),
    #[error("empty response from text generation")]
    Empty,
}

/// Opaque text-generation capability.
///
/// Implementations block the calling thread for the duration of one request
/// and must be shareable across the repair worker pool.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError>;
}
