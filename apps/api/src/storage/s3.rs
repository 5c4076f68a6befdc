use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{object_key, FileStore, StorageError, StoredFile, StoredObject, UploadFile};

/// Stores uploads in a single S3 (or MinIO) bucket. The returned path is the object key.
#[derive(Clone)]
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn upload(&self, file: &UploadFile) -> Result<StoredFile, StorageError> {
        let key = object_key(Uuid::new_v4(), &file.name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(file.data.clone()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        info!("Uploaded {} bytes to s3://{}/{}", file.size(), self.bucket, key);

        Ok(StoredFile {
            path: key,
            name: file.name.clone(),
            size: file.size() as u64,
            content_type: file.content_type.clone(),
            uploaded_at: Utc::now(),
        })
    }

    async fn read(&self, path: &str) -> Result<StoredObject, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::Read(e.to_string())
                }
            })?;

        let content_type = output.content_type().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Read(e.to_string()))?;

        Ok(StoredObject {
            data: data.into_bytes(),
            content_type,
        })
    }
}
