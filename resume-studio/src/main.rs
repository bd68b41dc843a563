//! resume-studio - resume drafting tool
//!
//! A CLI for generating resume drafts through the resume service, filling
//! their image placeholders, previewing the result and exporting it.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{resolve_dialect, Cli, Commands, DialectArg, GenerateArgs};
use resume_studio::config::{ClientConfig, ENV_API_TOKEN, ENV_API_URL, ENV_TIMEOUT_SECS};
use resume_studio::document_model::{
    Document, ImagePayload, ImageStore, PlaceholderId, PlaceholderRegistry,
};
use resume_studio::merge::{merge, referenced_ids};
use resume_studio::render::render;
use resume_studio::service::{ExportFormat, ImageFile, ServiceClient};
use resume_studio::workflow::{Command, Completion, Workflow};
use std::fs;
use std::path::Path;

const PREVIEW_TITLE: &str = "Resume Preview";

/// Main entry point for the resume-studio CLI application
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(cli.config.as_deref(), cli.api_url, cli.token, cli.timeout)?;
            handle_generate_command(&config, args).await?;
        }

        Commands::Preview {
            body,
            placeholders,
            dialect,
            images,
            output,
            title,
        } => {
            handle_preview_command(&body, placeholders.as_deref(), dialect, &images, &output, &title)?;
        }

        Commands::Export {
            body,
            dialect,
            format,
            filename,
            out_dir,
        } => {
            let config = load_config(cli.config.as_deref(), cli.api_url, cli.token, cli.timeout)?;
            handle_export_command(&config, &body, dialect, format.into(), filename, &out_dir).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

/// Resolve the service configuration: file, environment, then flags
fn load_config(
    path: Option<&Path>,
    api_url: Option<String>,
    token: Option<String>,
    timeout: Option<u64>,
) -> Result<ClientConfig> {
    let mut config =
        ClientConfig::discover(path).context("Failed to load service configuration")?;

    let timeout = timeout.map(|secs| secs.to_string());
    config
        .apply_overrides(|key| match key {
            ENV_API_URL => api_url.clone(),
            ENV_API_TOKEN => token.clone(),
            ENV_TIMEOUT_SECS => timeout.clone(),
            _ => None,
        })
        .context("Invalid service options")?;

    log::info!(
        "Using resume service at {} (timeout {}s)",
        config.base_url,
        config.timeout_secs
    );
    Ok(config)
}

/// Read a draft body, taking the dialect from the flag or the extension
fn read_document(path: &Path, dialect: Option<DialectArg>) -> Result<Document> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft {}", path.display()))?;
    Ok(Document::new(resolve_dialect(dialect, path), body))
}

/// Read a placeholders JSON file, or derive the registry from the draft
///
/// Without a file every referenced id becomes its own description.
fn read_registry(path: Option<&Path>, document: &Document) -> Result<PlaceholderRegistry> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read placeholders {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid placeholders JSON in {}", path.display()))
        }
        None => Ok(PlaceholderRegistry::from_pairs(
            referenced_ids(document)
                .into_iter()
                .map(|id| (id.clone(), id.to_string())),
        )),
    }
}

/// Handle the generate command
async fn handle_generate_command(config: &ClientConfig, args: GenerateArgs) -> Result<()> {
    let client = ServiceClient::new(config).context("Failed to create service client")?;
    let mut workflow = Workflow::new(client);
    let request = args.form.clone().into_form().into_request();

    // Stage 1: Obtain the draft
    match &args.update {
        Some(path) => {
            println!("\n[Stage 1/4] Revising draft {}...", path.display());
            let document = read_document(path, args.dialect)?;
            let registry = read_registry(args.placeholders.as_deref(), &document)?;
            workflow.accept_generated(document, registry);
            workflow
                .run(Command::Update(request))
                .await
                .context("Failed to revise resume")?;
        }
        None => {
            println!("\n[Stage 1/4] Generating draft for {}...", request.name);
            workflow
                .run(Command::Generate(request))
                .await
                .context("Failed to generate resume")?;
        }
    }

    let dialect = workflow
        .document()
        .map(|document| document.dialect().to_string())
        .unwrap_or_default();
    println!(
        "✓ Received {} draft with {} image placeholder(s)",
        dialect,
        workflow.registry().len()
    );
    for row in workflow.placeholders() {
        println!("    {} - {}", row.id, row.description);
    }

    // Stage 2: Resolve images
    println!("\n[Stage 2/4] Resolving images...");
    resolve_images(&mut workflow, &args).await?;
    if let Some(merged) = workflow.merged() {
        println!(
            "✓ {} resolved, {} unresolved",
            merged.summary.resolved, merged.summary.unresolved
        );
    }

    // Stage 3: Save draft and preview
    println!("\n[Stage 3/4] Saving draft...");
    save_draft(&workflow, &args)?;

    // Stage 4: Export
    match args.export {
        Some(format) => {
            let format: ExportFormat = format.into();
            println!("\n[Stage 4/4] Exporting to {}...", format);
            let artifact = workflow
                .export(format, args.filename.as_str())
                .await
                .context("Failed to export resume")?;
            let path = artifact.write_to(&args.out_dir).with_context(|| {
                format!("Failed to write export to {}", args.out_dir.display())
            })?;
            println!("✓ Successfully wrote: {}", path.display());
        }
        None => println!("\n[Stage 4/4] No export format given, skipping export"),
    }

    println!("\n✓ Done!");

    Ok(())
}

/// Upload, search and generate images as requested
///
/// A failure for one placeholder is reported and the others still run.
async fn resolve_images(workflow: &mut Workflow<ServiceClient>, args: &GenerateArgs) -> Result<()> {
    for (id, path) in &args.images {
        let file = ImageFile::read(Path::new(path))
            .with_context(|| format!("Failed to read image {}", path))?;
        match workflow.upload_image(PlaceholderId::new(id.as_str()), file).await {
            Ok(Completion::ImageResolved(_)) => println!("✓ {}: uploaded {}", id, path),
            Ok(_) => println!("⚠ {}: upload arrived for a replaced draft", id),
            Err(e) => println!("⚠ {}: {}", id, e.user_message()),
        }
    }

    for (id, query) in &args.searches {
        let found = match workflow
            .search_images(PlaceholderId::new(id.as_str()), query.as_str())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                println!("⚠ {}: {}", id, e.user_message());
                continue;
            }
        };
        println!("  {}: {} result(s) for \"{}\"", id, found, query.trim());
        if found == 0 {
            continue;
        }
        match workflow.choose_search_result(args.pick.saturating_sub(1)) {
            Ok(_) => println!("✓ {}: using search result {}", id, args.pick),
            Err(e) => println!("⚠ {}: {}", id, e),
        }
    }

    for (id, prompt) in &args.generated_images {
        match workflow
            .generate_image(PlaceholderId::new(id.as_str()), prompt.as_str())
            .await
        {
            Ok(Completion::ImageResolved(_)) => println!("✓ {}: generated image", id),
            Ok(_) => println!("⚠ {}: image arrived for a replaced draft", id),
            Err(e) => println!("⚠ {}: {}", id, e.user_message()),
        }
    }

    Ok(())
}

fn save_draft(workflow: &Workflow<ServiceClient>, args: &GenerateArgs) -> Result<()> {
    let Some(document) = workflow.document() else {
        return Ok(());
    };

    if let Some(path) = &args.save_body {
        fs::write(path, document.body())
            .with_context(|| format!("Failed to write draft to {}", path.display()))?;
        println!("✓ Successfully wrote: {}", path.display());
    }

    if let Some(path) = &args.save_placeholders {
        let json = serde_json::to_string_pretty(workflow.registry())
            .context("Failed to serialize placeholders")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write placeholders to {}", path.display()))?;
        println!("✓ Successfully wrote: {}", path.display());
    }

    if let Some(path) = &args.preview {
        if let Some(preview) = workflow.render() {
            write_page(path, &preview.to_page(PREVIEW_TITLE))?;
        }
    }

    Ok(())
}

fn write_page(path: &Path, page: &str) -> Result<()> {
    fs::write(path, page)
        .with_context(|| format!("Failed to write preview to {}", path.display()))?;
    println!("✓ Successfully wrote: {}", path.display());
    Ok(())
}

/// Handle the preview command
fn handle_preview_command(
    body: &Path,
    placeholders: Option<&Path>,
    dialect: Option<DialectArg>,
    images: &[(String, String)],
    output: &Path,
    title: &str,
) -> Result<()> {
    let document = read_document(body, dialect)?;
    let registry = read_registry(placeholders, &document)?;

    println!("Rendering {} draft: {}", document.dialect(), body.display());

    let mut store = ImageStore::new();
    for (id, path) in images {
        if !registry.contains(id) {
            println!("⚠ {}: not a placeholder of this draft, skipped", id);
            continue;
        }
        let bytes = fs::read(path).with_context(|| format!("Failed to read image {}", path))?;
        store.set(PlaceholderId::new(id.as_str()), ImagePayload::from_bytes(&bytes));
    }

    let merged = merge(&document, &registry, &store);
    println!(
        "✓ {} resolved, {} unresolved, {} left as written",
        merged.summary.resolved, merged.summary.unresolved, merged.summary.passthrough
    );

    write_page(output, &render(&merged).to_page(title))
}

/// Handle the export command
async fn handle_export_command(
    config: &ClientConfig,
    body: &Path,
    dialect: Option<DialectArg>,
    format: ExportFormat,
    filename: Option<String>,
    out_dir: &Path,
) -> Result<()> {
    let document = read_document(body, dialect)?;
    let filename = filename.unwrap_or_else(|| {
        body.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("resume")
            .to_string()
    });

    println!("Exporting {} to {}...", body.display(), format);

    let client = ServiceClient::new(config).context("Failed to create service client")?;
    let mut workflow = Workflow::new(client);
    workflow.accept_generated(document, PlaceholderRegistry::new());

    let artifact = workflow
        .export(format, filename)
        .await
        .context("Failed to export resume")?;
    let path = artifact
        .write_to(out_dir)
        .with_context(|| format!("Failed to write export to {}", out_dir.display()))?;

    println!("✓ Successfully wrote: {}", path.display());

    Ok(())
}
