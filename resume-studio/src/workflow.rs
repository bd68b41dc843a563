//! Workflow orchestrator
//!
//! Holds the draft, its placeholder registry, the image resolutions and the
//! navigation state, and turns user actions into service calls.
//!
//! Actions run in two phases. [`Workflow::begin`] validates the input, marks
//! the control busy and hands back an owned future performing the request.
//! Awaiting that future yields an [`Outcome`] which [`Workflow::complete`]
//! applies as one state update. Several actions may be in flight at once;
//! outcomes are applied in the order they are completed, so the last one to
//! complete wins.

mod command;
mod error;

pub use command::{Command, Completion, Control, Outcome, PendingAction};
pub use error::{ActionError, ValidationError};

use crate::document_model::{Document, ImagePayload, ImageStore, PlaceholderId, PlaceholderRegistry};
use crate::merge::{merge, RenderableDocument};
use crate::render::{render, RenderedPreview};
use crate::service::{
    ExportArtifact, ExportFormat, ExportRequest, ImageFile, ResumeBackend, ResumeForm,
    ResumeRequest, ServiceError, UpdateRequest,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stage of the editing flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Fill in the resume form
    Form,
    /// Review and edit the draft
    Edit,
    /// Resolve image placeholders
    Images,
    /// Convert and download
    Export,
}

impl Step {
    /// The following stage, if any
    pub fn next(self) -> Option<Step> {
        match self {
            Step::Form => Some(Step::Edit),
            Step::Edit => Some(Step::Images),
            Step::Images => Some(Step::Export),
            Step::Export => None,
        }
    }

    /// The preceding stage, if any
    pub fn previous(self) -> Option<Step> {
        match self {
            Step::Form => None,
            Step::Edit => Some(Step::Form),
            Step::Images => Some(Step::Edit),
            Step::Export => Some(Step::Images),
        }
    }
}

/// How the draft is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Rendered document
    #[default]
    Preview,
    /// Raw draft text
    Source,
}

/// One row of the placeholder listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderStatus {
    /// Placeholder id
    pub id: PlaceholderId,
    /// Human-readable description from the registry
    pub description: String,
    /// Whether an image is set for it
    pub resolved: bool,
    /// Whether it is the current selection
    pub selected: bool,
}

/// Top-level editing state driven by user actions
pub struct Workflow<B: ResumeBackend + 'static> {
    backend: Arc<B>,
    document: Option<Document>,
    resume_id: Option<String>,
    request: Option<ResumeRequest>,
    registry: PlaceholderRegistry,
    images: ImageStore,
    /// Bumped whenever a new draft replaces the image store
    epoch: u64,
    selected: Option<PlaceholderId>,
    search: Option<(PlaceholderId, Vec<ImagePayload>)>,
    step: Step,
    view: ViewMode,
    /// In-flight calls per control
    busy: BTreeMap<Control, usize>,
    errors: BTreeMap<Control, String>,
}

impl<B: ResumeBackend + 'static> Workflow<B> {
    /// Start an empty workflow on top of a backend
    pub fn new(backend: B) -> Self {
        Self::with_shared(Arc::new(backend))
    }

    /// Start an empty workflow on top of a shared backend
    pub fn with_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            document: None,
            resume_id: None,
            request: None,
            registry: PlaceholderRegistry::new(),
            images: ImageStore::new(),
            epoch: 0,
            selected: None,
            search: None,
            step: Step::Form,
            view: ViewMode::default(),
            busy: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// Current draft, unmerged
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Id the service assigned to the current draft
    pub fn resume_id(&self) -> Option<&str> {
        self.resume_id.as_deref()
    }

    /// Placeholders declared by the current draft
    pub fn registry(&self) -> &PlaceholderRegistry {
        &self.registry
    }

    /// Images resolved so far
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Placeholder image actions apply to
    pub fn selected(&self) -> Option<&PlaceholderId> {
        self.selected.as_ref()
    }

    /// Candidates from the last search of the selected placeholder
    pub fn search_results(&self) -> &[ImagePayload] {
        match (&self.search, &self.selected) {
            (Some((id, results)), Some(selected)) if id == selected => results,
            _ => &[],
        }
    }

    /// Current stage
    pub fn step(&self) -> Step {
        self.step
    }

    /// Current view mode
    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Whether a call started from `control` is still in flight
    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.get(&control).is_some_and(|count| *count > 0)
    }

    /// Inline error message shown next to `control`
    pub fn error(&self, control: Control) -> Option<&str> {
        self.errors.get(&control).map(String::as_str)
    }

    fn has_content(&self) -> bool {
        self.document.as_ref().is_some_and(|doc| !doc.is_empty())
    }

    // ---- synchronous transitions ----

    /// Replace the draft with a freshly generated one
    ///
    /// Resolutions, selection and search results belonged to the previous
    /// draft and are dropped.
    pub fn accept_generated(&mut self, document: Document, registry: PlaceholderRegistry) {
        log::info!(
            "New {} draft with {} image placeholder(s)",
            document.dialect(),
            registry.len()
        );
        self.document = Some(document);
        self.registry = registry;
        self.images.clear();
        self.epoch += 1;
        self.selected = None;
        self.search = None;
    }

    /// Replace the draft with a revision of itself
    ///
    /// Resolutions survive for placeholders the revision still declares.
    fn accept_revision(&mut self, document: Document, registry: PlaceholderRegistry) {
        log::info!(
            "Revised {} draft with {} image placeholder(s)",
            document.dialect(),
            registry.len()
        );
        self.images.retain(|id| registry.contains(id.as_str()));
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !registry.contains(id.as_str()))
        {
            self.selected = None;
        }
        if self
            .search
            .as_ref()
            .is_some_and(|(id, _)| !registry.contains(id.as_str()))
        {
            self.search = None;
        }
        self.document = Some(document);
        self.registry = registry;
    }

    /// Replace the body after a manual edit, keeping the dialect
    ///
    /// # Returns
    /// * `true` - The body was replaced
    /// * `false` - There is no draft to edit
    pub fn accept_edit(&mut self, body: impl Into<String>) -> bool {
        match &self.document {
            Some(document) => {
                self.document = Some(document.with_body(body));
                true
            }
            None => false,
        }
    }

    /// Record an image for a placeholder
    ///
    /// # Returns
    /// * `true` - The image was stored, replacing any earlier one
    /// * `false` - The id is not a placeholder of the current draft
    pub fn accept_image(&mut self, id: PlaceholderId, payload: ImagePayload) -> bool {
        if !self.registry.contains(id.as_str()) {
            log::debug!("Ignoring image for unknown placeholder {}", id);
            return false;
        }
        self.images.set(id, payload);
        true
    }

    /// Make a placeholder the target of the image controls
    ///
    /// Ids outside the registry leave the selection unchanged.
    pub fn select_placeholder(&mut self, id: &str) -> bool {
        match self.registry.ids().find(|known| known.as_str() == id) {
            Some(known) => {
                self.selected = Some(known.clone());
                true
            }
            None => {
                log::debug!("Ignoring selection of unknown placeholder {}", id);
                false
            }
        }
    }

    /// Move to the next step
    ///
    /// Leaving the form requires a non-empty draft.
    pub fn advance(&mut self) -> Result<Step, ValidationError> {
        match self.step.next() {
            Some(next) => self.go_to(next),
            None => Ok(self.step),
        }
    }

    /// Move to the previous step
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Jump to a step
    pub fn go_to(&mut self, step: Step) -> Result<Step, ValidationError> {
        if step > Step::Form && !self.has_content() {
            return Err(ValidationError::EmptyDocument);
        }
        self.step = step;
        Ok(step)
    }

    /// Switch between preview and source view
    pub fn toggle_view(&mut self) -> ViewMode {
        self.view = match self.view {
            ViewMode::Preview => ViewMode::Source,
            ViewMode::Source => ViewMode::Preview,
        };
        self.view
    }

    /// Placeholders in registry order with their resolution state
    pub fn placeholders(&self) -> Vec<PlaceholderStatus> {
        self.registry
            .iter()
            .map(|(id, description)| PlaceholderStatus {
                id: id.clone(),
                description: description.to_string(),
                resolved: self.images.is_resolved(id.as_str()),
                selected: self.selected.as_ref() == Some(id),
            })
            .collect()
    }

    /// The draft with current resolutions substituted
    pub fn merged(&self) -> Option<RenderableDocument> {
        self.document
            .as_ref()
            .map(|document| merge(document, &self.registry, &self.images))
    }

    /// Preview of the merged draft
    pub fn render(&self) -> Option<RenderedPreview> {
        self.merged().map(|merged| render(&merged))
    }

    /// Resolve the selected placeholder with one of the search candidates
    pub fn choose_search_result(&mut self, index: usize) -> Result<PlaceholderId, ValidationError> {
        let selected = self
            .selected
            .clone()
            .ok_or(ValidationError::NoPlaceholderSelected)?;
        let payload = self
            .search_results()
            .get(index)
            .cloned()
            .ok_or(ValidationError::NoSearchResult(index + 1))?;

        self.accept_image(selected.clone(), payload);
        Ok(selected)
    }

    // ---- service actions ----

    /// Validate a command and start its request
    ///
    /// On a validation failure nothing is sent and the message is recorded
    /// next to the control.
    ///
    /// # Returns
    /// * `Ok(PendingAction)` - Await it and pass the outcome to [`Workflow::complete`]
    /// * `Err(ValidationError)` - The command was rejected
    pub fn begin(&mut self, command: Command) -> Result<PendingAction, ValidationError> {
        let control = command.control();
        let pending = match self.prepare(command) {
            Ok(pending) => pending,
            Err(e) => {
                log::debug!("Rejected {} action: {}", control, e);
                self.errors.insert(control, e.to_string());
                return Err(e);
            }
        };

        self.errors.remove(&control);
        *self.busy.entry(control).or_insert(0) += 1;
        Ok(pending)
    }

    fn known_placeholder(&self, id: &PlaceholderId) -> Result<(), ValidationError> {
        if self.registry.contains(id.as_str()) {
            Ok(())
        } else {
            Err(ValidationError::UnknownPlaceholder(id.to_string()))
        }
    }

    fn current_document(&self) -> Result<&Document, ValidationError> {
        self.document
            .as_ref()
            .filter(|document| !document.is_empty())
            .ok_or(ValidationError::EmptyDocument)
    }

    fn prepare(&self, command: Command) -> Result<PendingAction, ValidationError> {
        let backend = Arc::clone(&self.backend);
        let epoch = self.epoch;

        let pending: PendingAction = match command {
            Command::Generate(request) => Box::pin(async move {
                let result = backend.generate_resume(&request).await;
                Outcome::Generated {
                    revision: false,
                    request,
                    result,
                }
            }),
            Command::Update(request) => {
                let update = UpdateRequest::new(self.current_document()?.clone(), request.clone());
                Box::pin(async move {
                    let result = backend.update_resume(&update).await;
                    Outcome::Generated {
                        revision: true,
                        request,
                        result,
                    }
                })
            }
            Command::UploadImage { id, file } => {
                self.known_placeholder(&id)?;
                if file.is_empty() {
                    return Err(ValidationError::EmptyFile);
                }
                Box::pin(async move {
                    let result = backend.upload_image(&id, &file).await;
                    Outcome::ImageResolved {
                        control: Control::Upload,
                        epoch,
                        id,
                        result,
                    }
                })
            }
            Command::SearchImages { id, query } => {
                self.known_placeholder(&id)?;
                let query = query.trim().to_string();
                if query.is_empty() {
                    return Err(ValidationError::EmptyQuery);
                }
                Box::pin(async move {
                    let result = backend.search_images(&id, &query).await;
                    Outcome::SearchCompleted { epoch, id, result }
                })
            }
            Command::GenerateImage { id, prompt } => {
                self.known_placeholder(&id)?;
                let prompt = prompt.trim().to_string();
                if prompt.is_empty() {
                    return Err(ValidationError::EmptyPrompt);
                }
                Box::pin(async move {
                    let result = backend.generate_image(&id, &prompt).await;
                    Outcome::ImageResolved {
                        control: Control::GenerateImage,
                        epoch,
                        id,
                        result,
                    }
                })
            }
            Command::Export { format, filename } => {
                let document = self.current_document()?.clone();
                let filename = filename.trim().to_string();
                if filename.is_empty() {
                    return Err(ValidationError::EmptyFilename);
                }
                let request = ExportRequest {
                    document,
                    format,
                    filename,
                };
                Box::pin(async move {
                    let result = backend
                        .export(&request)
                        .await
                        .map(|bytes| ExportArtifact::new(&request.filename, request.format, bytes));
                    Outcome::Exported { result }
                })
            }
        };

        Ok(pending)
    }

    /// Apply the outcome of a finished request
    ///
    /// A failure is recorded next to its control and leaves the state as it
    /// was before the action started.
    pub fn complete(&mut self, outcome: Outcome) -> Result<Completion, ServiceError> {
        let control = outcome.control();
        if let Some(count) = self.busy.get_mut(&control) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.busy.remove(&control);
            }
        }

        let applied = self.apply(outcome);
        if let Err(e) = &applied {
            log::warn!("{} failed: {}", control, e);
            self.errors.insert(control, e.user_message());
        }
        applied
    }

    fn apply(&mut self, outcome: Outcome) -> Result<Completion, ServiceError> {
        match outcome {
            Outcome::Generated {
                revision,
                request,
                result,
            } => {
                let response = result?;
                let resume_id = response.id.clone();
                let (document, registry) = response.into_parts()?;
                if revision {
                    self.accept_revision(document, registry);
                } else {
                    self.accept_generated(document, registry);
                }
                self.resume_id = resume_id;
                self.request = Some(request);
                Ok(Completion::DocumentReplaced)
            }
            Outcome::ImageResolved {
                epoch, id, result, ..
            } => {
                let payload = result?;
                if epoch != self.epoch {
                    log::debug!("Dropping image for {} from a replaced draft", id);
                    return Ok(Completion::ImageIgnored(id));
                }
                if self.accept_image(id.clone(), payload) {
                    Ok(Completion::ImageResolved(id))
                } else {
                    Ok(Completion::ImageIgnored(id))
                }
            }
            Outcome::SearchCompleted { epoch, id, result } => {
                let results = result?;
                if epoch != self.epoch || !self.registry.contains(id.as_str()) {
                    log::debug!("Dropping search results for {} from a replaced draft", id);
                    return Ok(Completion::SearchIgnored(id));
                }
                let count = results.len();
                self.selected = Some(id.clone());
                self.search = Some((id, results));
                Ok(Completion::SearchResults(count))
            }
            Outcome::Exported { result } => Ok(Completion::Exported(result?)),
        }
    }

    /// Run both phases of an action
    pub async fn run(&mut self, command: Command) -> Result<Completion, ActionError> {
        let pending = self.begin(command)?;
        let outcome = pending.await;
        Ok(self.complete(outcome)?)
    }

    /// Generate a new draft from the form
    pub async fn generate(&mut self, form: ResumeForm) -> Result<(), ActionError> {
        self.run(Command::Generate(form.into_request())).await?;
        Ok(())
    }

    /// Send the current draft back with the fields it was generated from
    pub async fn update(&mut self) -> Result<(), ActionError> {
        let request = self
            .request
            .clone()
            .unwrap_or_else(|| ResumeForm::default().into_request());
        self.run(Command::Update(request)).await?;
        Ok(())
    }

    /// Upload a local file for a placeholder
    pub async fn upload_image(
        &mut self,
        id: PlaceholderId,
        file: ImageFile,
    ) -> Result<Completion, ActionError> {
        self.run(Command::UploadImage { id, file }).await
    }

    /// Search candidate images for a placeholder
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of candidates now listed
    pub async fn search_images(
        &mut self,
        id: PlaceholderId,
        query: impl Into<String>,
    ) -> Result<usize, ActionError> {
        let completion = self
            .run(Command::SearchImages {
                id,
                query: query.into(),
            })
            .await?;
        Ok(match completion {
            Completion::SearchResults(count) => count,
            _ => 0,
        })
    }

    /// Generate an image for a placeholder from a prompt
    pub async fn generate_image(
        &mut self,
        id: PlaceholderId,
        prompt: impl Into<String>,
    ) -> Result<Completion, ActionError> {
        self.run(Command::GenerateImage {
            id,
            prompt: prompt.into(),
        })
        .await
    }

    /// Convert the current draft to a file
    pub async fn export(
        &mut self,
        format: ExportFormat,
        filename: impl Into<String>,
    ) -> Result<ExportArtifact, ActionError> {
        let completion = self
            .run(Command::Export {
                format,
                filename: filename.into(),
            })
            .await?;
        match completion {
            Completion::Exported(artifact) => Ok(artifact),
            other => Err(ServiceError::Decode(format!("unexpected completion {:?}", other)).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_model::Dialect;
    use crate::service::GeneratedResume;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        fail_uploads: bool,
        markdown: String,
        placeholders: Vec<(&'static str, &'static str)>,
    }

    impl FakeBackend {
        fn with_draft(markdown: &str, placeholders: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                markdown: markdown.to_string(),
                placeholders,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn draft(&self) -> GeneratedResume {
            GeneratedResume {
                id: Some("1".to_string()),
                markdown_content: Some(self.markdown.clone()),
                html_content: None,
                image_placeholders: PlaceholderRegistry::from_pairs(self.placeholders.clone()),
            }
        }
    }

    #[async_trait]
    impl ResumeBackend for FakeBackend {
        async fn generate_resume(
            &self,
            request: &ResumeRequest,
        ) -> Result<GeneratedResume, ServiceError> {
            self.record(format!("generate {}", request.name));
            Ok(self.draft())
        }

        async fn update_resume(
            &self,
            request: &UpdateRequest,
        ) -> Result<GeneratedResume, ServiceError> {
            self.record(format!("update {}", request.document.body()));
            Ok(GeneratedResume {
                id: Some("1".to_string()),
                markdown_content: Some("![logo](image:p2)".to_string()),
                html_content: None,
                image_placeholders: PlaceholderRegistry::from_pairs([("p2", "logo")]),
            })
        }

        async fn upload_image(
            &self,
            id: &PlaceholderId,
            file: &ImageFile,
        ) -> Result<ImagePayload, ServiceError> {
            self.record(format!("upload {} {}", id, file.file_name));
            if self.fail_uploads {
                return Err(ServiceError::Api {
                    status: 500,
                    message: "Error uploading image: disk full".to_string(),
                });
            }
            Ok(ImagePayload::from_reference(format!(
                "https://img/{}",
                file.file_name
            )))
        }

        async fn search_images(
            &self,
            id: &PlaceholderId,
            query: &str,
        ) -> Result<Vec<ImagePayload>, ServiceError> {
            self.record(format!("search {} {}", id, query));
            Ok(vec![
                ImagePayload::from_reference("https://img/a.png"),
                ImagePayload::from_reference("https://img/b.png"),
            ])
        }

        async fn generate_image(
            &self,
            id: &PlaceholderId,
            prompt: &str,
        ) -> Result<ImagePayload, ServiceError> {
            self.record(format!("generate-image {} {}", id, prompt));
            Ok(ImagePayload::from_reference("https://img/generated.png"))
        }

        async fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ServiceError> {
            self.record(format!("export {}", request.format));
            Ok(request.document.body().as_bytes().to_vec())
        }
    }

    fn portrait_backend() -> FakeBackend {
        FakeBackend::with_draft(
            "# Jane\n\n![portrait](image:p1)",
            vec![("p1", "portrait")],
        )
    }

    fn png_file(name: &str) -> ImageFile {
        ImageFile::new(name, vec![0x89, b'P', b'N', b'G'])
    }

    #[tokio::test]
    async fn test_generate_populates_draft() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        assert_eq!(workflow.resume_id(), Some("1"));
        assert_eq!(workflow.document().unwrap().dialect(), Dialect::Markdown);
        assert_eq!(workflow.registry().get("p1"), Some("portrait"));
        assert!(!workflow.is_busy(Control::Generate));

        let merged = workflow.merged().unwrap();
        assert!(merged.body.contains("[Image Placeholder: portrait]"));
    }

    #[tokio::test]
    async fn test_new_generation_clears_images() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();
        workflow
            .upload_image(PlaceholderId::new("p1"), png_file("me.png"))
            .await
            .unwrap();
        workflow.select_placeholder("p1");
        assert!(workflow.images().is_resolved("p1"));

        workflow.generate(ResumeForm::default()).await.unwrap();
        assert!(workflow.images().is_empty());
        assert!(workflow.selected().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_images_still_declared() {
        let backend = FakeBackend::with_draft(
            "![portrait](image:p1) ![logo](image:p2)",
            vec![("p1", "portrait"), ("p2", "logo")],
        );
        let mut workflow = Workflow::new(backend);
        workflow.generate(ResumeForm::default()).await.unwrap();
        workflow.accept_image(PlaceholderId::new("p1"), ImagePayload::from_reference("a"));
        workflow.accept_image(PlaceholderId::new("p2"), ImagePayload::from_reference("b"));

        workflow.update().await.unwrap();

        assert!(!workflow.images().is_resolved("p1"));
        assert_eq!(workflow.images().get("p2").unwrap().as_str(), "b");
        assert_eq!(
            workflow.backend.calls(),
            vec![
                "generate Xiao Han".to_string(),
                "update ![portrait](image:p1) ![logo](image:p2)".to_string()
            ]
        );
    }

    #[test]
    fn test_unknown_image_is_ignored() {
        let mut workflow = Workflow::new(FakeBackend::default());
        workflow.accept_generated(
            Document::Markdown("![portrait](image:p1)".to_string()),
            PlaceholderRegistry::from_pairs([("p1", "portrait")]),
        );

        assert!(!workflow.accept_image(PlaceholderId::new("p9"), ImagePayload::from_reference("x")));
        assert!(workflow.images().is_empty());
    }

    #[test]
    fn test_accept_edit_keeps_dialect() {
        let mut workflow = Workflow::new(FakeBackend::default());
        assert!(!workflow.accept_edit("nothing to edit"));

        workflow.accept_generated(
            Document::Html("<p>old</p>".to_string()),
            PlaceholderRegistry::new(),
        );
        assert!(workflow.accept_edit("<p>new</p>"));
        assert_eq!(
            workflow.document(),
            Some(&Document::Html("<p>new</p>".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_state() {
        let backend = FakeBackend {
            fail_uploads: true,
            ..portrait_backend()
        };
        let mut workflow = Workflow::new(backend);
        workflow.generate(ResumeForm::default()).await.unwrap();
        workflow.accept_image(PlaceholderId::new("p1"), ImagePayload::from_reference("old"));

        let result = workflow
            .upload_image(PlaceholderId::new("p1"), png_file("new.png"))
            .await;

        assert!(matches!(result, Err(ActionError::Service(_))));
        assert_eq!(workflow.images().get("p1").unwrap().as_str(), "old");
        assert_eq!(
            workflow.error(Control::Upload),
            Some("Error uploading image: disk full")
        );
        assert!(!workflow.is_busy(Control::Upload));
    }

    #[tokio::test]
    async fn test_empty_export_sends_nothing() {
        let mut workflow = Workflow::new(FakeBackend::default());
        workflow.accept_generated(Document::Markdown("   ".to_string()), PlaceholderRegistry::new());

        let result = workflow.export(ExportFormat::Pdf, "resume").await;

        assert!(matches!(
            result,
            Err(ActionError::Validation(ValidationError::EmptyDocument))
        ));
        assert!(workflow.backend.calls().is_empty());
        assert!(workflow.error(Control::Export).is_some());
        assert!(!workflow.is_busy(Control::Export));
    }

    #[tokio::test]
    async fn test_export_names_artifact() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        let artifact = workflow.export(ExportFormat::Docx, " jane ").await.unwrap();
        assert_eq!(artifact.file_name, "jane.docx");
        assert_eq!(artifact.bytes, b"# Jane\n\n![portrait](image:p1)");

        let result = workflow.export(ExportFormat::Docx, "  ").await;
        assert!(matches!(
            result,
            Err(ActionError::Validation(ValidationError::EmptyFilename))
        ));
    }

    #[tokio::test]
    async fn test_blank_query_and_prompt_rejected() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        let search = workflow.search_images(PlaceholderId::new("p1"), "  ").await;
        assert!(matches!(
            search,
            Err(ActionError::Validation(ValidationError::EmptyQuery))
        ));
        let generated = workflow.generate_image(PlaceholderId::new("p1"), "").await;
        assert!(matches!(
            generated,
            Err(ActionError::Validation(ValidationError::EmptyPrompt))
        ));
        let upload = workflow
            .upload_image(PlaceholderId::new("p1"), ImageFile::new("empty.png", Vec::new()))
            .await;
        assert!(matches!(
            upload,
            Err(ActionError::Validation(ValidationError::EmptyFile))
        ));
        assert_eq!(workflow.backend.calls(), vec!["generate Xiao Han".to_string()]);
    }

    #[tokio::test]
    async fn test_last_completion_wins() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();
        let id = PlaceholderId::new("p1");

        let first = workflow
            .begin(Command::UploadImage {
                id: id.clone(),
                file: png_file("first.png"),
            })
            .unwrap();
        let second = workflow
            .begin(Command::GenerateImage {
                id: id.clone(),
                prompt: "a watercolor portrait".to_string(),
            })
            .unwrap();
        assert!(workflow.is_busy(Control::Upload));
        assert!(workflow.is_busy(Control::GenerateImage));

        let second = second.await;
        let first = first.await;
        workflow.complete(second).unwrap();
        workflow.complete(first).unwrap();

        assert_eq!(workflow.images().get("p1").unwrap().as_str(), "https://img/first.png");
        assert!(!workflow.is_busy(Control::Upload));
        assert!(!workflow.is_busy(Control::GenerateImage));
    }

    #[tokio::test]
    async fn test_stale_image_after_regeneration_is_dropped() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        let pending = workflow
            .begin(Command::UploadImage {
                id: PlaceholderId::new("p1"),
                file: png_file("old.png"),
            })
            .unwrap();
        workflow.generate(ResumeForm::default()).await.unwrap();

        let completion = workflow.complete(pending.await).unwrap();
        assert_eq!(completion, Completion::ImageIgnored(PlaceholderId::new("p1")));
        assert!(workflow.images().is_empty());
    }

    #[tokio::test]
    async fn test_search_then_choose() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        assert_eq!(
            workflow.choose_search_result(0),
            Err(ValidationError::NoPlaceholderSelected)
        );

        let count = workflow
            .search_images(PlaceholderId::new("p1"), " mountain ")
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(workflow.selected().map(|id| id.as_str()), Some("p1"));
        assert_eq!(workflow.search_results().len(), 2);

        assert_eq!(
            workflow.choose_search_result(5),
            Err(ValidationError::NoSearchResult(6))
        );
        workflow.choose_search_result(1).unwrap();
        assert_eq!(workflow.images().get("p1").unwrap().as_str(), "https://img/b.png");
        assert!(workflow
            .backend
            .calls()
            .contains(&"search p1 mountain".to_string()));
    }

    #[tokio::test]
    async fn test_action_clears_previous_error() {
        let mut workflow = Workflow::new(portrait_backend());
        workflow.generate(ResumeForm::default()).await.unwrap();

        let _ = workflow.search_images(PlaceholderId::new("p1"), "").await;
        assert!(workflow.error(Control::Search).is_some());

        workflow
            .search_images(PlaceholderId::new("p1"), "desk")
            .await
            .unwrap();
        assert!(workflow.error(Control::Search).is_none());
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let mut workflow = Workflow::new(FakeBackend::default());
        let result = workflow.begin(Command::GenerateImage {
            id: PlaceholderId::new("p1"),
            prompt: "logo".to_string(),
        });
        assert!(matches!(
            result,
            Err(ValidationError::UnknownPlaceholder(id)) if id == "p1"
        ));
    }

    #[test]
    fn test_step_guard() {
        let mut workflow = Workflow::new(FakeBackend::default());
        assert_eq!(workflow.advance(), Err(ValidationError::EmptyDocument));
        assert_eq!(workflow.step(), Step::Form);

        workflow.accept_generated(Document::Markdown("# Jane".to_string()), PlaceholderRegistry::new());
        assert_eq!(workflow.advance(), Ok(Step::Edit));
        assert_eq!(workflow.go_to(Step::Export), Ok(Step::Export));
        assert_eq!(workflow.advance(), Ok(Step::Export));
        assert_eq!(workflow.back(), Step::Images);
    }

    #[test]
    fn test_toggle_view() {
        let mut workflow = Workflow::new(FakeBackend::default());
        assert_eq!(workflow.view(), ViewMode::Preview);
        assert_eq!(workflow.toggle_view(), ViewMode::Source);
        assert_eq!(workflow.toggle_view(), ViewMode::Preview);
    }

    #[test]
    fn test_placeholder_listing() {
        let mut workflow = Workflow::new(FakeBackend::default());
        workflow.accept_generated(
            Document::Markdown("![a](image:p2) ![b](image:p1)".to_string()),
            PlaceholderRegistry::from_pairs([("p2", "logo"), ("p1", "portrait")]),
        );
        workflow.accept_image(PlaceholderId::new("p1"), ImagePayload::from_reference("x"));
        assert!(workflow.select_placeholder("p2"));
        assert!(!workflow.select_placeholder("p9"));

        let rows = workflow.placeholders();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_str(), "p2");
        assert!(!rows[0].resolved);
        assert!(rows[0].selected);
        assert_eq!(rows[1].description, "portrait");
        assert!(rows[1].resolved);
    }

    #[test]
    fn test_render_requires_document() {
        let mut workflow = Workflow::new(FakeBackend::default());
        assert!(workflow.render().is_none());

        workflow.accept_generated(Document::Markdown("# Jane".to_string()), PlaceholderRegistry::new());
        let preview = workflow.render().unwrap();
        assert!(preview.html().contains("<h1>Jane</h1>"));
    }
}
