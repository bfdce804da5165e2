use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use log::{error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ImageStore, ServiceError};

/// Stores images in an S3 bucket and hands out their public object URLs.
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
}

impl S3ImageStore {
    pub fn new(client: S3Client, bucket: &str) -> Self {
        S3ImageStore {
            client,
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, key: &str, source: &Path, content_type: &str) -> Result<String, ServiceError> {
        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| ServiceError::Storage(format!("cannot read {}: {}", source.display(), e)))?;

        info!("Uploading file to S3: s3://{}/{}", self.bucket, key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                error!("Failed to upload to S3: {:?}", err);
                ServiceError::Storage(format!("put_object failed: {}", err))
            })?;

        Ok(self.object_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| ServiceError::Storage(format!("delete_object failed: {}", err)))?;
        Ok(())
    }
}

/// Keeps images on local disk under `upload_dir`, served back at `/uploads/{key}`.
pub struct LocalImageStore {
    upload_dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        LocalImageStore {
            upload_dir: upload_dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, key: &str, source: &Path, _content_type: &str) -> Result<String, ServiceError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let target = self.upload_dir.join(key);
        tokio::fs::copy(source, &target).await?;
        info!("Stored image at {}", target.display());
        Ok(format!("{}/uploads/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        match tokio::fs::remove_file(self.upload_dir.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_copies_file_and_builds_url() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("scratch.png");
        tokio::fs::write(&source, b"png-bytes").await.unwrap();

        let store = LocalImageStore::new(root.path().join("uploads"), "http://localhost:8080/");
        let url = store.store("item.png", &source, "image/png").await.unwrap();

        assert_eq!(url, "http://localhost:8080/uploads/item.png");
        let stored = tokio::fs::read(root.path().join("uploads/item.png")).await.unwrap();
        assert_eq!(stored, b"png-bytes");

        store.delete("item.png").await.unwrap();
        assert!(!root.path().join("uploads/item.png").exists());
        store.delete("item.png").await.unwrap();
    }
}
