use async_trait::async_trait;
use log::info;
use reqwest::multipart::{Form, Part};

use super::{check_status, http_client, BackgroundRemover, ServiceError};

const REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

/// remove.bg client.
pub struct RemoveBgClient {
    client: reqwest::Client,
    api_key: String,
}

impl RemoveBgClient {
    pub fn new(api_key: &str) -> Result<Self, ServiceError> {
        Ok(RemoveBgClient {
            client: http_client()?,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Vec<u8>, ServiceError> {
        let form = Form::new()
            .part(
                "image_file",
                Part::bytes(image.to_vec()).file_name(file_name.to_string()),
            )
            .text("size", "auto")
            .text("format", "png");

        let response = self
            .client
            .post(REMOVE_BG_URL)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status("remove.bg", response).await?;

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::Malformed {
                service: "remove.bg",
                detail: "empty image returned".to_string(),
            });
        }
        info!("Background removed ({} bytes in, {} bytes out)", image.len(), bytes.len());
        Ok(bytes.to_vec())
    }
}
