use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::Feedback;

/// Key-value key for a submission record.
pub fn resume_key(id: Uuid) -> String {
    format!("resume:{id}")
}

/// Feedback as stored on the record: `""` until the analysis completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackSlot {
    Ready(Box<Feedback>),
    Pending(String),
}

impl Default for FeedbackSlot {
    fn default() -> Self {
        FeedbackSlot::Pending(String::new())
    }
}

impl FeedbackSlot {
    pub fn is_ready(&self) -> bool {
        matches!(self, FeedbackSlot::Ready(_))
    }
}

/// One resume submission as persisted in the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    #[serde(default)]
    pub feedback: FeedbackSlot,
}
