//! Document model shared by the merge engine, the render surface and the workflow
//!
//! A generated resume is made of three pieces that travel together:
//! - the [`Document`] body in one fixed [`Dialect`]
//! - the [`PlaceholderRegistry`] produced alongside it by the generation call
//! - the [`ImageStore`] the user fills in afterwards

// Submodules
mod document;
mod image;
mod placeholder;

// Re-export public types
pub use document::{Dialect, Document};
pub use image::{sniff_mime, ImagePayload, ImageStore};
pub use placeholder::{PlaceholderId, PlaceholderRegistry};
