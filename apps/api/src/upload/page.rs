//! Upload page state.
//!
//! A page holds three pieces of state: whether an analysis is running, the
//! status line shown to the user, and the currently selected file. Once a
//! submission starts the form stays disabled: a page that finished or stalled
//! keeps `is_processing` set and only its status text changes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::storage::UploadFile;
use crate::upload::pipeline::{AnalysisOutcome, StatusSink, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Processing,
    Done,
    Stalled,
}

/// The text fields of the upload form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormFields {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("a submission is already in progress")]
    Busy,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

/// Read-only view of a page returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub id: Uuid,
    pub is_processing: bool,
    pub status_text: String,
    pub phase: Phase,
    pub file: Option<FileSummary>,
    pub resume_id: Option<Uuid>,
}

#[derive(Debug)]
struct PageState {
    is_processing: bool,
    status_text: String,
    /// Bytes of the selected file. Handed to the submission on `begin`.
    file: Option<UploadFile>,
    file_summary: Option<FileSummary>,
    phase: Phase,
    resume_id: Option<Uuid>,
}

pub struct UploadPage {
    id: Uuid,
    state: Mutex<PageState>,
}

impl UploadPage {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: Mutex::new(PageState {
                is_processing: false,
                status_text: String::new(),
                file: None,
                file_summary: None,
                phase: Phase::Idle,
                resume_id: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        let state = self.state.lock().await;
        self.snapshot_of(&state)
    }

    fn snapshot_of(&self, state: &PageState) -> PageSnapshot {
        PageSnapshot {
            id: self.id,
            is_processing: state.is_processing,
            status_text: state.status_text.clone(),
            phase: state.phase,
            file: state.file_summary.clone(),
            resume_id: state.resume_id,
        }
    }

    /// Replaces the selected file, or clears it with `None`.
    pub async fn select_file(&self, file: Option<UploadFile>) -> Result<PageSnapshot, PageError> {
        let mut state = self.state.lock().await;
        if state.is_processing {
            return Err(PageError::Busy);
        }
        state.file_summary = file.as_ref().map(|f| FileSummary {
            name: f.name.clone(),
            content_type: f.content_type.clone(),
            size: f.size(),
        });
        state.file = file;
        Ok(self.snapshot_of(&state))
    }

    /// Starts a submission. Returns `Ok(None)` without touching state when no
    /// file is selected.
    pub async fn begin(&self, fields: FormFields) -> Result<Option<Submission>, PageError> {
        let mut state = self.state.lock().await;
        if state.is_processing {
            return Err(PageError::Busy);
        }
        let Some(file) = state.file.take() else {
            return Ok(None);
        };

        state.is_processing = true;
        state.phase = Phase::Processing;

        Ok(Some(Submission {
            company_name: fields.company_name,
            job_title: fields.job_title,
            job_description: fields.job_description,
            file,
        }))
    }

    /// Records how the analysis ended. The status text was already set by the pipeline.
    pub async fn finish(&self, outcome: &AnalysisOutcome) {
        let mut state = self.state.lock().await;
        match outcome {
            AnalysisOutcome::Completed(record) => {
                state.phase = Phase::Done;
                state.resume_id = Some(record.id);
            }
            AnalysisOutcome::Stalled { resume_id, .. } => {
                state.phase = Phase::Stalled;
                state.resume_id = *resume_id;
            }
        }
    }
}

#[async_trait]
impl StatusSink for UploadPage {
    async fn set_status(&self, text: &str) {
        let mut state = self.state.lock().await;
        state.status_text = text.to_string();
    }
}

/// In-memory registry of open pages.
#[derive(Default)]
pub struct PageRegistry {
    pages: RwLock<HashMap<Uuid, Arc<UploadPage>>>,
}

impl PageRegistry {
    pub async fn open(&self) -> Arc<UploadPage> {
        let page = Arc::new(UploadPage::new(Uuid::new_v4()));
        self.pages.write().await.insert(page.id(), page.clone());
        page
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<UploadPage>> {
        self.pages.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<UploadPage>> {
        self.pages.write().await.remove(&id)
    }
}
