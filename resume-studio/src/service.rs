//! External resume service: wire types, errors and the HTTP client
//!
//! Generation, image search/generation and format conversion all happen on
//! the service side. The rest of the crate talks to it through the
//! [`ResumeBackend`] trait so that the workflow can be driven by the real
//! [`ServiceClient`] or by an in-memory backend in tests.

use crate::document_model::{ImagePayload, PlaceholderId};
use async_trait::async_trait;

mod client;
mod error;
mod types;

pub use client::ServiceClient;
pub use error::ServiceError;
pub use types::{
    ExportArtifact, ExportFormat, ExportRequest, GeneratedResume, ImageFile, ResumeForm,
    ResumeRequest, UpdateRequest,
};

/// Operations offered by the resume service
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    /// `POST /resume/generate`
    async fn generate_resume(&self, request: &ResumeRequest)
        -> Result<GeneratedResume, ServiceError>;

    /// `POST /resume/update`
    async fn update_resume(&self, request: &UpdateRequest)
        -> Result<GeneratedResume, ServiceError>;

    /// `POST /image/upload`
    async fn upload_image(
        &self,
        placeholder_id: &PlaceholderId,
        file: &ImageFile,
    ) -> Result<ImagePayload, ServiceError>;

    /// `POST /image/search`, candidates in service order
    async fn search_images(
        &self,
        placeholder_id: &PlaceholderId,
        query: &str,
    ) -> Result<Vec<ImagePayload>, ServiceError>;

    /// `POST /image/generate`
    async fn generate_image(
        &self,
        placeholder_id: &PlaceholderId,
        prompt: &str,
    ) -> Result<ImagePayload, ServiceError>;

    /// `POST /export/convert`, returning the converted file bytes
    async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ServiceError>;
}
