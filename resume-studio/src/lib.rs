//! resume-studio - resume drafting with image placeholders
//!
//! A generated resume draft refers to images through placeholders
//! (`![desc](image:id)` in markdown, `src="image:id"` in HTML). The crate
//! keeps the draft, the placeholder registry and the images chosen so far,
//! merges them into a renderable document and previews it safely.
//! Generation, image search and format conversion are delegated to an
//! external HTTP service.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]

pub mod config;
pub mod document_model;
pub mod merge;
pub mod render;
pub mod service;
pub mod workflow;

pub use config::{ClientConfig, ConfigError};
pub use document_model::{Dialect, Document, ImagePayload, ImageStore, PlaceholderId, PlaceholderRegistry};
pub use merge::{merge, MergeSummary, RenderableDocument};
pub use render::{render, RenderedPreview};
pub use service::{ResumeBackend, ServiceClient, ServiceError};
pub use workflow::{ActionError, Workflow};
