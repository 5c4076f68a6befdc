//! The analysis pipeline behind the upload form.
//!
//! Steps run strictly in order and each waits for the previous one:
//! upload resume → convert to image → upload image → save record →
//! request feedback → parse feedback → save record again.
//!
//! The first failure sets that step's status text and stops the run. Nothing
//! is retried and nothing already written is undone: an uploaded resume stays
//! in storage, and a record saved before the feedback step keeps `feedback: ""`.

use std::fmt::Display;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::feedback::{parse_feedback, prompts::prepare_instructions};
use crate::models::resume::{resume_key, FeedbackSlot, ResumeRecord};
use crate::state::Services;
use crate::storage::UploadFile;

pub const STATUS_PROCESSING: &str = "Processing your resume...";
pub const STATUS_CONVERTING: &str = "Converting to image...";
pub const STATUS_UPLOADING_IMAGE: &str = "Uploading the image...";
pub const STATUS_PREPARING: &str = "Preparing data...";
pub const STATUS_ANALYSING: &str = "Analysing resume...";
pub const STATUS_COMPLETE: &str = "Analysis complete, redirecting...";

/// Receives status text as the pipeline advances.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, text: &str);
}

/// A submitted form with its selected file.
#[derive(Debug, Clone)]
pub struct Submission {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: UploadFile,
}

/// The step a run stalled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    UploadResume,
    ConvertImage,
    UploadImage,
    SaveRecord,
    Analyse,
    ParseFeedback,
    SaveFeedback,
}

impl Step {
    pub fn failure_status(self) -> &'static str {
        match self {
            Step::UploadResume => "Failed to upload file",
            Step::ConvertImage => "Failed to convert PDF to image",
            Step::UploadImage => "Failed to upload image",
            Step::SaveRecord => "Failed to save resume data",
            Step::Analyse => "Failed to analyse resume",
            Step::ParseFeedback => "Failed to parse feedback",
            Step::SaveFeedback => "Failed to save feedback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(ResumeRecord),
    /// `resume_id` is set once the first record write has succeeded.
    Stalled { step: Step, resume_id: Option<Uuid> },
}

pub async fn analyse(
    services: &Services,
    submission: Submission,
    status: &dyn StatusSink,
) -> AnalysisOutcome {
    let Submission {
        company_name,
        job_title,
        job_description,
        file,
    } = submission;

    status.set_status(STATUS_PROCESSING).await;
    let uploaded_file = match services.files.upload(&file).await {
        Ok(stored) => stored,
        Err(e) => return stall(status, Step::UploadResume, None, e).await,
    };

    status.set_status(STATUS_CONVERTING).await;
    let image = match services.converter.convert(&file).await {
        Ok(image) => image,
        Err(e) => return stall(status, Step::ConvertImage, None, e).await,
    };
    info!(
        "Converted {} to a {}x{} preview",
        file.name, image.width, image.height
    );

    status.set_status(STATUS_UPLOADING_IMAGE).await;
    let uploaded_image = match services.files.upload(&image.file).await {
        Ok(stored) => stored,
        Err(e) => return stall(status, Step::UploadImage, None, e).await,
    };

    status.set_status(STATUS_PREPARING).await;
    let id = Uuid::new_v4();
    let key = resume_key(id);
    let mut record = ResumeRecord {
        id,
        resume_path: uploaded_file.path,
        image_path: uploaded_image.path,
        company_name,
        job_title,
        job_description,
        feedback: FeedbackSlot::default(),
    };

    if let Err(e) = save(services, &key, &record).await {
        return stall(status, Step::SaveRecord, None, e).await;
    }
    info!("Saved {key} with pending feedback");

    status.set_status(STATUS_ANALYSING).await;
    let instructions = prepare_instructions(&record.job_title, &record.job_description);
    let response = match services.ai.feedback(&record.resume_path, &instructions).await {
        Ok(response) => response,
        Err(e) => return stall(status, Step::Analyse, Some(id), e).await,
    };
    let Some(feedback_text) = response.text() else {
        return stall(status, Step::Analyse, Some(id), "response carried no text").await;
    };

    let feedback = match parse_feedback(feedback_text) {
        Ok(feedback) => feedback,
        Err(e) => return stall(status, Step::ParseFeedback, Some(id), e).await,
    };
    record.feedback = FeedbackSlot::Ready(Box::new(feedback));

    if let Err(e) = save(services, &key, &record).await {
        return stall(status, Step::SaveFeedback, Some(id), e).await;
    }
    info!("Saved {key} with feedback");

    status.set_status(STATUS_COMPLETE).await;
    AnalysisOutcome::Completed(record)
}

async fn save(services: &Services, key: &str, record: &ResumeRecord) -> anyhow::Result<()> {
    let value = serde_json::to_string(record)?;
    services.kv.set(key, &value).await?;
    Ok(())
}

async fn stall(
    status: &dyn StatusSink,
    step: Step,
    resume_id: Option<Uuid>,
    cause: impl Display,
) -> AnalysisOutcome {
    warn!("Analysis stopped at {step:?}: {cause}");
    status.set_status(step.failure_status()).await;
    AnalysisOutcome::Stalled { step, resume_id }
}
