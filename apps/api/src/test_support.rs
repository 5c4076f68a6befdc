//! In-memory collaborators and fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SESSION_RETENTION};
use crate::convert::{image_file_name, ConvertError, ConvertedImage, ImageConverter, PNG_CONTENT_TYPE};
use crate::feedback::{FeedbackClient, FeedbackError};
use crate::kv::{KvError, KvStore};
use crate::llm_client::{ContentBlock, LlmError, LlmResponse, MessageContent};
use crate::models::resume::{FeedbackSlot, ResumeRecord};
use crate::state::{AppState, Services};
use crate::storage::{object_key, FileStore, StorageError, StoredFile, StoredObject, UploadFile};
use crate::upload::page::PageRegistry;
use crate::upload::pipeline::{StatusSink, Submission};

pub const FEEDBACK_JSON: &str = r#"{
    "overallScore": 81,
    "ATS": {"score": 77, "tips": [{"type": "improve", "tip": "Mention Kubernetes"}]},
    "toneAndStyle": {"score": 85, "tips": [{"type": "good", "tip": "Confident", "explanation": "Strong verbs."}]},
    "content": {"score": 80, "tips": []},
    "structure": {"score": 82, "tips": []},
    "skills": {"score": 79, "tips": []}
}"#;

pub fn sample_pdf() -> UploadFile {
    UploadFile {
        name: "resume.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        data: Bytes::from_static(b"%PDF-1.7\n%fake resume\n"),
    }
}

pub fn sample_submission() -> Submission {
    Submission {
        company_name: "Acme".to_string(),
        job_title: "Backend Engineer".to_string(),
        job_description: "Design and run Rust services.".to_string(),
        file: sample_pdf(),
    }
}

pub fn sample_record() -> ResumeRecord {
    ResumeRecord {
        id: Uuid::new_v4(),
        resume_path: "uploads/1/resume.pdf".to_string(),
        image_path: "uploads/2/resume.png".to_string(),
        company_name: "Acme".to_string(),
        job_title: "Backend Engineer".to_string(),
        job_description: "Design and run Rust services.".to_string(),
        feedback: FeedbackSlot::default(),
    }
}

pub fn text_reply(text: &str) -> LlmResponse {
    LlmResponse {
        content: MessageContent::Text(text.to_string()),
        usage: None,
    }
}

pub fn block_reply(text: Option<&str>) -> LlmResponse {
    let blocks = text
        .map(|t| {
            vec![ContentBlock {
                block_type: "text".to_string(),
                text: Some(t.to_string()),
            }]
        })
        .unwrap_or_default();
    LlmResponse {
        content: MessageContent::Blocks(blocks),
        usage: None,
    }
}

/// Stores files in a map. Upload number `n` (1-based) can be made to fail.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<Vec<(String, StoredObject)>>,
    attempts: AtomicUsize,
    fail_on: Mutex<Option<usize>>,
}

impl MemoryFileStore {
    pub fn fail_upload_number(&self, n: usize) {
        *self.fail_on.lock().unwrap() = Some(n);
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(&self, file: &UploadFile) -> Result<StoredFile, StorageError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on.lock().unwrap() == Some(attempt) {
            return Err(StorageError::Upload("injected failure".to_string()));
        }
        let path = object_key(Uuid::new_v4(), &file.name);
        self.files.lock().unwrap().push((
            path.clone(),
            StoredObject {
                data: file.data.clone(),
                content_type: Some(file.content_type.clone()),
            },
        ));
        Ok(StoredFile {
            path,
            name: file.name.clone(),
            size: file.size() as u64,
            content_type: file.content_type.clone(),
            uploaded_at: Utc::now(),
        })
    }

    async fn read(&self, path: &str) -> Result<StoredObject, StorageError> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, object)| object.clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

/// Records every successful write. Write number `n` (1-based) can be made to fail.
#[derive(Default)]
pub struct MemoryKv {
    writes: Mutex<Vec<(String, String)>>,
    values: Mutex<HashMap<String, String>>,
    attempts: AtomicUsize,
    fail_on: Mutex<Option<usize>>,
}

impl MemoryKv {
    pub fn fail_write_number(&self, n: usize) {
        *self.fail_on.lock().unwrap() = Some(n);
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on.lock().unwrap() == Some(attempt) {
            return Err(KvError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "injected failure",
            ))));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.value(key))
    }
}

/// Returns a canned PNG, or fails when told to.
#[derive(Default)]
pub struct StubConverter {
    fail: AtomicBool,
}

impl StubConverter {
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageConverter for StubConverter {
    async fn convert(&self, file: &UploadFile) -> Result<ConvertedImage, ConvertError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConvertError::Pdfium("injected failure".to_string()));
        }
        Ok(ConvertedImage {
            file: UploadFile {
                name: image_file_name(&file.name),
                content_type: PNG_CONTENT_TYPE.to_string(),
                data: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            },
            width: 2448,
            height: 3168,
        })
    }
}

/// Replies with a configurable response and records each request.
pub struct StubFeedback {
    reply: Mutex<Option<LlmResponse>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl Default for StubFeedback {
    fn default() -> Self {
        Self {
            reply: Mutex::new(Some(text_reply(FEEDBACK_JSON))),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl StubFeedback {
    pub fn fail(&self) {
        *self.reply.lock().unwrap() = None;
    }

    pub fn reply_with(&self, response: LlmResponse) {
        *self.reply.lock().unwrap() = Some(response);
    }

    pub fn reply_with_text(&self, text: &str) {
        self.reply_with(text_reply(text));
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackClient for StubFeedback {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<LlmResponse, FeedbackError> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), instructions.to_string()));
        self.reply
            .lock()
            .unwrap()
            .clone()
            .ok_or(FeedbackError::Llm(LlmError::RateLimited { retries: 3 }))
    }
}

/// Collects every status line in order.
#[derive(Default)]
pub struct RecordingSink {
    statuses: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StatusSink for RecordingSink {
    async fn set_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }
}

/// Fakes kept as concrete types so tests can steer and inspect them.
pub struct FakeServices {
    pub files: Arc<MemoryFileStore>,
    pub kv: Arc<MemoryKv>,
    pub ai: Arc<StubFeedback>,
    pub converter: Arc<StubConverter>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self {
            files: Arc::new(MemoryFileStore::default()),
            kv: Arc::new(MemoryKv::default()),
            ai: Arc::new(StubFeedback::default()),
            converter: Arc::new(StubConverter::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            files: self.files.clone(),
            kv: self.kv.clone(),
            ai: self.ai.clone(),
            converter: self.converter.clone(),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            services: self.services(),
            pages: Arc::new(PageRegistry::default()),
            config: test_config(),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        redis_url: "redis://127.0.0.1:6379".to_string(),
        s3_bucket: "resumes".to_string(),
        s3_endpoint: "http://127.0.0.1:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        anthropic_api_key: "test".to_string(),
        pdfium_library_path: None,
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        session_retention: DEFAULT_SESSION_RETENTION,
        port: 8080,
        rust_log: "debug".to_string(),
    }
}
