//! Request and response shapes exchanged with the resume service

use super::error::ServiceError;
use crate::document_model::{sniff_mime, Document, PlaceholderRegistry};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_NAME: &str = "Xiao Han";
const DEFAULT_POSITION: &str = "Algorithm Engineer";

/// Fields the user fills in before generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeForm {
    /// Full name, the resume title
    pub name: String,
    /// Target position
    pub position: String,
    /// Work experience, free text
    pub experience: String,
    /// Education, free text
    pub education: String,
    /// Skills, free text
    pub skills: String,
    /// Contact details
    pub contact: String,
    /// Anything else the draft should mention
    pub additional: String,
}

impl ResumeForm {
    /// Build the generation request
    ///
    /// Blank name or position fall back to sample values so a draft can be
    /// generated from an empty form. Blank optional fields are left out of
    /// `additional_info`.
    pub fn into_request(self) -> ResumeRequest {
        let mut additional_info = Map::new();
        for (key, value) in [
            ("experience", self.experience),
            ("education", self.education),
            ("skills", self.skills),
            ("contact", self.contact),
            ("additional", self.additional),
        ] {
            if !value.trim().is_empty() {
                additional_info.insert(key.to_string(), Value::String(value));
            }
        }

        ResumeRequest {
            name: non_blank_or(self.name, DEFAULT_NAME),
            position: non_blank_or(self.position, DEFAULT_POSITION),
            additional_info,
        }
    }
}

fn non_blank_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Body of `POST /resume/generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeRequest {
    /// Full name
    pub name: String,
    /// Target position
    pub position: String,
    /// Optional form fields that were filled in, keyed by field name
    pub additional_info: Map<String, Value>,
}

/// Body of `POST /resume/update`: the current draft plus the form fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest {
    /// Current draft, sent as `markdown_content` or `html_content`
    #[serde(flatten)]
    pub document: Document,
    /// Full name
    pub name: String,
    /// Target position
    pub position: String,
    /// Optional form fields, as in [`ResumeRequest`]
    pub additional_info: Map<String, Value>,
}

impl UpdateRequest {
    /// Pair the current draft with the fields it was generated from
    pub fn new(document: Document, request: ResumeRequest) -> Self {
        Self {
            document,
            name: request.name,
            position: request.position,
            additional_info: request.additional_info,
        }
    }
}

/// Response of the generate and update endpoints
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedResume {
    /// Service-side id of the stored resume; numeric ids become strings
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    /// Draft body when the service answered in markdown
    #[serde(default)]
    pub markdown_content: Option<String>,
    /// Draft body when the service answered in HTML
    #[serde(default)]
    pub html_content: Option<String>,
    /// Placeholders the draft declares, in response order
    #[serde(default)]
    pub image_placeholders: PlaceholderRegistry,
}

impl GeneratedResume {
    /// Split the response into the document and its placeholder registry
    ///
    /// The dialect follows whichever content field the service filled in.
    /// A response carrying both is read as markdown.
    pub fn into_parts(self) -> Result<(Document, PlaceholderRegistry), ServiceError> {
        let document = match (self.markdown_content, self.html_content) {
            (Some(markdown), html) => {
                if html.is_some() {
                    log::warn!("Service returned both markdown and HTML content; using markdown");
                }
                Document::Markdown(markdown)
            }
            (None, Some(html)) => Document::Html(html),
            (None, None) => {
                return Err(ServiceError::Decode(
                    "response has neither markdown_content nor html_content".to_string(),
                ))
            }
        };
        Ok((document, self.image_placeholders))
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// An image file picked by the user for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Name sent as the multipart filename
    pub file_name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Create an image file from in-memory bytes
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an image file from disk
    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self { file_name, bytes })
    }

    /// MIME type sniffed from the content
    pub fn mime_type(&self) -> &'static str {
        sniff_mime(&self.bytes)
    }

    /// Whether there is nothing to upload
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Formats the export service converts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Portable Document Format
    Pdf,
    /// Word document
    Docx,
    /// PowerPoint slides
    Pptx,
    /// Markdown text
    Md,
    /// Standalone HTML page
    Html,
}

impl ExportFormat {
    /// File extension of the download, also the wire value
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Pptx => "pptx",
            ExportFormat::Md => "md",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// Body of `POST /export/convert`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    /// Unmerged draft, sent as `markdown_content` or `html_content`
    #[serde(flatten)]
    pub document: Document,
    /// Target format
    pub format: ExportFormat,
    /// Download name without extension
    pub filename: String,
}

/// A converted file ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `<filename>.<extension>`
    pub file_name: String,
    /// Converted file content
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Name the download after the requested filename and format
    pub fn new(filename: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}.{}", filename, format.extension()),
            bytes,
        }
    }

    /// Write the file into a directory, creating it if needed
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(io::Error)` - Error creating the directory or writing the file
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
