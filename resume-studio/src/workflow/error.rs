//! Errors raised by workflow actions

use crate::service::ServiceError;
use thiserror::Error;

/// Input problems caught before any request is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No draft to act on
    #[error("There is no resume content yet. Generate or enter a resume first.")]
    EmptyDocument,

    /// Search terms are blank
    #[error("Enter a search term first.")]
    EmptyQuery,

    /// Image prompt is blank
    #[error("Describe the image you want to generate.")]
    EmptyPrompt,

    /// Upload has no content
    #[error("Choose an image file to upload.")]
    EmptyFile,

    /// Export filename is blank
    #[error("Enter a file name for the export.")]
    EmptyFilename,

    /// The action needs a selected placeholder
    #[error("Select an image placeholder first.")]
    NoPlaceholderSelected,

    /// The id is not declared by the current draft
    #[error("Unknown image placeholder '{0}'.")]
    UnknownPlaceholder(String),

    /// One-based result number past the end of the results
    #[error("There is no search result number {0}.")]
    NoSearchResult(usize),
}

/// Failure of a user action
///
/// Either kind leaves the workflow state as it was before the action.
#[derive(Error, Debug)]
pub enum ActionError {
    /// Rejected before any request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service call failed
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ActionError {
    /// Message shown next to the control that failed
    pub fn user_message(&self) -> String {
        match self {
            ActionError::Validation(e) => e.to_string(),
            ActionError::Service(e) => e.user_message(),
        }
    }
}
