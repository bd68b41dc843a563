//! HTTP client for the resume service
//!
//! One explicitly constructed client owns the base URL, the optional bearer
//! token and the request deadline. Every endpoint goes through it; nothing
//! in the crate builds requests on its own.

use super::error::ServiceError;
use super::types::{ExportRequest, GeneratedResume, ImageFile, ResumeRequest, UpdateRequest};
use super::ResumeBackend;
use crate::config::ClientConfig;
use crate::document_model::{ImagePayload, PlaceholderId};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ImageSearchBody<'a> {
    query: &'a str,
    placeholder_id: &'a PlaceholderId,
}

#[derive(Debug, Serialize)]
struct ImageGenerateBody<'a> {
    prompt: &'a str,
    placeholder_id: &'a PlaceholderId,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    image_data: Option<String>,
}

impl ImageResponse {
    fn into_payload(self) -> Result<ImagePayload, ServiceError> {
        self.image_data
            .filter(|data| !data.is_empty())
            .map(ImagePayload::from_reference)
            .ok_or_else(|| ServiceError::Decode("response has no image_data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Client for the resume service HTTP API
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl ServiceClient {
    /// Build a client from configuration
    ///
    /// # Returns
    /// * `Ok(ServiceClient)` - Ready to send requests
    /// * `Err(ServiceError)` - The base URL is invalid or the HTTP client could not be built
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| ServiceError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// Full URL of an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        log::debug!("POST {}", url);
        let request = self.client.post(url);
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path).json(body).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Turn non-2xx responses into `ServiceError::Api`
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::warn!("Resume service returned {}: {}", status, body);
    Err(ServiceError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract the `detail` field of an error body, else the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) if !detail.is_null() => detail.to_string(),
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl ResumeBackend for ServiceClient {
    async fn generate_resume(
        &self,
        request: &ResumeRequest,
    ) -> Result<GeneratedResume, ServiceError> {
        log::info!("Requesting resume generation for {}", request.name);
        self.post_json("resume/generate", request).await
    }

    async fn update_resume(&self, request: &UpdateRequest) -> Result<GeneratedResume, ServiceError> {
        log::info!("Requesting resume update for {}", request.name);
        self.post_json("resume/update", request).await
    }

    async fn upload_image(
        &self,
        placeholder_id: &PlaceholderId,
        file: &ImageFile,
    ) -> Result<ImagePayload, ServiceError> {
        log::info!(
            "Uploading {} ({} bytes) for placeholder {}",
            file.file_name,
            file.bytes.len(),
            placeholder_id
        );
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new()
            .part("file", part)
            .text("placeholder_id", placeholder_id.to_string());

        let response = self.post("image/upload").multipart(form).send().await?;
        let response = check_status(response).await?;
        let image: ImageResponse = response.json().await?;
        image.into_payload()
    }

    async fn search_images(
        &self,
        placeholder_id: &PlaceholderId,
        query: &str,
    ) -> Result<Vec<ImagePayload>, ServiceError> {
        log::info!("Searching images for placeholder {}: {}", placeholder_id, query);
        let results: Vec<ImageResponse> = self
            .post_json(
                "image/search",
                &ImageSearchBody {
                    query,
                    placeholder_id,
                },
            )
            .await?;

        Ok(results
            .into_iter()
            .filter_map(|result| result.into_payload().ok())
            .collect())
    }

    async fn generate_image(
        &self,
        placeholder_id: &PlaceholderId,
        prompt: &str,
    ) -> Result<ImagePayload, ServiceError> {
        log::info!("Generating image for placeholder {}", placeholder_id);
        let image: ImageResponse = self
            .post_json(
                "image/generate",
                &ImageGenerateBody {
                    prompt,
                    placeholder_id,
                },
            )
            .await?;
        image.into_payload()
    }

    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ServiceError> {
        log::info!(
            "Exporting {} document as {}",
            request.document.dialect(),
            request.format
        );
        let response = self.post("export/convert").json(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
