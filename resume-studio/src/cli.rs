//! Command-line interface definitions for resume-studio

use clap::{Args, Parser, Subcommand, ValueEnum};
use resume_studio::document_model::Dialect;
use resume_studio::service::{ExportFormat, ResumeForm};
use std::path::{Path, PathBuf};

/// Body format of a draft file
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DialectArg {
    /// Markdown with `![desc](image:id)` references
    Markdown,
    /// HTML with `src="image:id"` references
    Html,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Markdown => Dialect::Markdown,
            DialectArg::Html => Dialect::Html,
        }
    }
}

/// Pick the dialect from the flag, else from the file extension
pub fn resolve_dialect(arg: Option<DialectArg>, path: &Path) -> Dialect {
    if let Some(arg) = arg {
        return arg.into();
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
            Dialect::Html
        }
        _ => Dialect::Markdown,
    }
}

/// Export format accepted by the conversion service
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Portable Document Format
    Pdf,
    /// Microsoft Word
    Docx,
    /// Microsoft PowerPoint
    Pptx,
    /// Markdown
    Md,
    /// Standalone HTML
    Html,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Docx => ExportFormat::Docx,
            FormatArg::Pptx => ExportFormat::Pptx,
            FormatArg::Md => ExportFormat::Md,
            FormatArg::Html => ExportFormat::Html,
        }
    }
}

/// CLI structure for the resume-studio application
#[derive(Parser)]
#[command(name = "resume-studio")]
#[command(version)]
#[command(about = "Generate, illustrate, preview and export resumes", long_about = None)]
pub struct Cli {
    /// Service configuration file (defaults to ./resume-studio.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the resume service
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Form fields sent for generation
#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    /// Candidate name
    #[arg(long)]
    pub name: Option<String>,

    /// Target position
    #[arg(long)]
    pub position: Option<String>,

    /// Work experience
    #[arg(long)]
    pub experience: Option<String>,

    /// Education background
    #[arg(long)]
    pub education: Option<String>,

    /// Skills
    #[arg(long)]
    pub skills: Option<String>,

    /// Contact details
    #[arg(long)]
    pub contact: Option<String>,

    /// Anything else the draft should mention
    #[arg(long)]
    pub additional: Option<String>,
}

impl FormArgs {
    /// Collect the flags into a form
    pub fn into_form(self) -> ResumeForm {
        ResumeForm {
            name: self.name.unwrap_or_default(),
            position: self.position.unwrap_or_default(),
            experience: self.experience.unwrap_or_default(),
            education: self.education.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            contact: self.contact.unwrap_or_default(),
            additional: self.additional.unwrap_or_default(),
        }
    }
}

/// Options of the generate command
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub form: FormArgs,

    /// Revise an existing draft instead of generating a new one
    #[arg(long, value_name = "BODY")]
    pub update: Option<PathBuf>,

    /// Placeholders JSON of the draft given with --update
    #[arg(long, value_name = "PATH", requires = "update")]
    pub placeholders: Option<PathBuf>,

    /// Dialect of the draft given with --update (defaults from its extension)
    #[arg(long, value_enum, requires = "update")]
    pub dialect: Option<DialectArg>,

    /// Upload a local image for a placeholder
    #[arg(long = "image", value_name = "ID=PATH", value_parser = parse_key_value)]
    pub images: Vec<(String, String)>,

    /// Search images for a placeholder and use a result
    #[arg(long = "search", value_name = "ID=QUERY", value_parser = parse_key_value)]
    pub searches: Vec<(String, String)>,

    /// Which search result to use, counting from 1
    #[arg(long, default_value_t = 1)]
    pub pick: usize,

    /// Generate an image for a placeholder from a prompt
    #[arg(long = "generate-image", value_name = "ID=PROMPT", value_parser = parse_key_value)]
    pub generated_images: Vec<(String, String)>,

    /// Write the preview page to this file
    #[arg(long, value_name = "PATH")]
    pub preview: Option<PathBuf>,

    /// Save the unmerged draft body
    #[arg(long, value_name = "PATH")]
    pub save_body: Option<PathBuf>,

    /// Save the placeholder registry as JSON
    #[arg(long, value_name = "PATH")]
    pub save_placeholders: Option<PathBuf>,

    /// Export the draft in this format
    #[arg(long, value_enum)]
    pub export: Option<FormatArg>,

    /// File name of the export, without extension
    #[arg(long, default_value = "resume")]
    pub filename: String,

    /// Directory the export is written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Available subcommands for resume-studio
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a draft, resolve its images and optionally export it
    Generate(GenerateArgs),

    /// Render a saved draft into a preview page without the service
    Preview {
        /// Draft body file
        #[arg(value_name = "BODY")]
        body: PathBuf,

        /// Placeholders JSON of the draft
        #[arg(long, value_name = "PATH")]
        placeholders: Option<PathBuf>,

        /// Dialect of the draft (defaults from its extension)
        #[arg(long, value_enum)]
        dialect: Option<DialectArg>,

        /// Local image for a placeholder, inlined as a data URL
        #[arg(long = "image", value_name = "ID=PATH", value_parser = parse_key_value)]
        images: Vec<(String, String)>,

        /// Output page
        #[arg(short, long, default_value = "preview.html")]
        output: PathBuf,

        /// Page title
        #[arg(long, default_value = "Resume Preview")]
        title: String,
    },

    /// Convert a saved draft through the export service
    Export {
        /// Draft body file
        #[arg(value_name = "BODY")]
        body: PathBuf,

        /// Dialect of the draft (defaults from its extension)
        #[arg(long, value_enum)]
        dialect: Option<DialectArg>,

        /// Target format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: FormatArg,

        /// File name of the export (defaults to the body file stem)
        #[arg(long)]
        filename: Option<String>,

        /// Directory the export is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

/// Parse an `id=value` argument
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing placeholder id in '{}'", arg));
    }
    Ok((key.to_string(), value.to_string()))
}
