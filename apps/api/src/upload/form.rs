//! Multipart form parsing for the upload endpoints.

use axum::extract::Multipart;

use crate::convert::{is_pdf, PDF_CONTENT_TYPE};
use crate::errors::AppError;
use crate::storage::UploadFile;
use crate::upload::page::FormFields;

pub const FIELD_COMPANY_NAME: &str = "company-name";
pub const FIELD_JOB_TITLE: &str = "job-title";
pub const FIELD_JOB_DESCRIPTION: &str = "job-description";
pub const FIELD_FILE: &str = "file";

#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: FormFields,
    pub file: Option<UploadFile>,
}

/// Reads the upload form. Unknown fields are drained and ignored.
/// A file part with an empty filename and no bytes counts as "no file selected".
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            FIELD_COMPANY_NAME => form.fields.company_name = read_text(field).await?,
            FIELD_JOB_TITLE => form.fields.job_title = read_text(field).await?,
            FIELD_JOB_DESCRIPTION => form.fields.job_description = read_text(field).await?,
            FIELD_FILE => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;

                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.file = Some(validate_file(
                    UploadFile {
                        name: file_name,
                        content_type,
                        data,
                    },
                    max_file_bytes,
                )?);
            }
            _ => {
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?;
            }
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Could not read form field: {e}")))
}

/// Only PDFs up to `max_file_bytes` are accepted. A PDF sent with a generic
/// content type is normalised to `application/pdf`.
pub fn validate_file(mut file: UploadFile, max_file_bytes: usize) -> Result<UploadFile, AppError> {
    if !is_pdf(&file) {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF files are allowed".to_string(),
        ));
    }
    if file.data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if file.size() > max_file_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} MB",
            max_file_bytes / (1024 * 1024)
        )));
    }
    file.content_type = PDF_CONTENT_TYPE.to_string();
    Ok(file)
}
