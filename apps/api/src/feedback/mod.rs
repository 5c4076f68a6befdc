//! ATS feedback: the structured response format and the client that asks the
//! model to review a stored resume.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, Attachment, LlmClient, LlmError, LlmResponse};
use crate::storage::{FileStore, StorageError};

pub mod prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    /// ATS tips carry no explanation; every other category does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub score: u32, // 0 – 100
    pub tips: Vec<Tip>,
}

/// Structured review of a resume against a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: Category,
    pub tone_and_style: Category,
    pub content: Category,
    pub structure: Category,
    pub skills: Category,
}

/// Parses model output into `Feedback`, tolerating markdown code fences.
pub fn parse_feedback(text: &str) -> Result<Feedback, serde_json::Error> {
    serde_json::from_str(strip_json_fences(text))
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("could not read resume: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Requests AI feedback for a file already in storage.
#[async_trait]
pub trait FeedbackClient: Send + Sync {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<LlmResponse, FeedbackError>;
}

/// Reads the stored file and sends it to Claude with the instructions.
#[derive(Clone)]
pub struct AnthropicFeedback {
    llm: LlmClient,
    files: Arc<dyn FileStore>,
}

impl AnthropicFeedback {
    pub fn new(llm: LlmClient, files: Arc<dyn FileStore>) -> Self {
        Self { llm, files }
    }
}

#[async_trait]
impl FeedbackClient for AnthropicFeedback {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<LlmResponse, FeedbackError> {
        let object = self.files.read(path).await?;
        let media_type = resolve_media_type(path, object.content_type.as_deref());
        let attachment = Attachment::from_media_type(media_type, &object.data)?;

        info!(
            "Requesting feedback for {path} ({media_type}, {} bytes)",
            object.data.len()
        );
        let response = self
            .llm
            .call_with_attachment(attachment, instructions, JSON_ONLY_SYSTEM)
            .await?;
        Ok(response)
    }
}

/// The stored content type wins. The path's extension is only consulted when the
/// store has no type or a generic one, since client file names need not carry one.
pub fn resolve_media_type<'a>(path: &str, content_type: Option<&'a str>) -> &'a str {
    let stored = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && !ct.eq_ignore_ascii_case("application/octet-stream"));
    match stored {
        Some(ct) => ct,
        None => media_type_for(path),
    }
}

/// Media type inferred from the stored path's extension.
pub fn media_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
