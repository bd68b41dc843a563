//! Actions the workflow sends to the service and the updates they produce

use crate::document_model::{ImagePayload, PlaceholderId};
use crate::service::{
    ExportArtifact, ExportFormat, GeneratedResume, ImageFile, ResumeRequest, ServiceError,
};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// The control an action belongs to
///
/// Busy indicators and inline error messages are keyed by control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    /// Draft generation and revision
    Generate,
    /// Image upload
    Upload,
    /// Image search and picking a result
    Search,
    /// Image generation from a prompt
    GenerateImage,
    /// Conversion to a downloadable file
    Export,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Control::Generate => "generate",
            Control::Upload => "upload",
            Control::Search => "search",
            Control::GenerateImage => "generate image",
            Control::Export => "export",
        };
        f.write_str(label)
    }
}

/// A user action that needs the service
#[derive(Debug, Clone)]
pub enum Command {
    /// Generate a new draft from the form
    Generate(ResumeRequest),
    /// Revise the current draft with the form fields
    Update(ResumeRequest),
    /// Upload a local file for a placeholder
    UploadImage {
        /// Placeholder the upload resolves
        id: PlaceholderId,
        /// File picked by the user
        file: ImageFile,
    },
    /// Search candidate images for a placeholder
    SearchImages {
        /// Placeholder the results are for
        id: PlaceholderId,
        /// Search terms
        query: String,
    },
    /// Generate an image for a placeholder from a prompt
    GenerateImage {
        /// Placeholder the image resolves
        id: PlaceholderId,
        /// Description of the wanted image
        prompt: String,
    },
    /// Convert the current draft to a file
    Export {
        /// Target format
        format: ExportFormat,
        /// Download name without extension
        filename: String,
    },
}

impl Command {
    /// The control that triggered this command
    pub fn control(&self) -> Control {
        match self {
            Command::Generate(_) | Command::Update(_) => Control::Generate,
            Command::UploadImage { .. } => Control::Upload,
            Command::SearchImages { .. } => Control::Search,
            Command::GenerateImage { .. } => Control::GenerateImage,
            Command::Export { .. } => Control::Export,
        }
    }
}

/// The single state update a finished request produces
///
/// Image outcomes carry the document epoch they were started in; outcomes
/// from before the latest generation are dropped when applied.
#[derive(Debug)]
pub enum Outcome {
    /// A generate or update call finished
    Generated {
        /// Whether this revised an existing draft
        revision: bool,
        /// Form fields the draft was requested with
        request: ResumeRequest,
        /// Service response
        result: Result<GeneratedResume, ServiceError>,
    },
    /// An upload or image generation finished
    ImageResolved {
        /// Upload or image generation
        control: Control,
        /// Document epoch at the time the request started
        epoch: u64,
        /// Placeholder the image resolves
        id: PlaceholderId,
        /// Service response
        result: Result<ImagePayload, ServiceError>,
    },
    /// A search finished
    SearchCompleted {
        /// Document epoch at the time the request started
        epoch: u64,
        /// Placeholder the search was for
        id: PlaceholderId,
        /// Candidates in service order
        result: Result<Vec<ImagePayload>, ServiceError>,
    },
    /// An export finished
    Exported {
        /// Converted file, named after the request
        result: Result<ExportArtifact, ServiceError>,
    },
}

impl Outcome {
    /// The control the originating command belonged to
    pub fn control(&self) -> Control {
        match self {
            Outcome::Generated { .. } => Control::Generate,
            Outcome::ImageResolved { control, .. } => *control,
            Outcome::SearchCompleted { .. } => Control::Search,
            Outcome::Exported { .. } => Control::Export,
        }
    }
}

/// What applying an outcome changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A new document and registry are in place
    DocumentReplaced,
    /// The placeholder now has this image
    ImageResolved(PlaceholderId),
    /// The placeholder no longer belongs to the current document
    ImageIgnored(PlaceholderId),
    /// Search results arrived for a document that has since been replaced
    SearchIgnored(PlaceholderId),
    /// Search results are available for the selected placeholder
    SearchResults(usize),
    /// The converted file is ready to save
    Exported(ExportArtifact),
}

/// A request in flight, owning everything it needs
pub type PendingAction = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;
