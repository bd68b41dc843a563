//! Placeholder substitution for document bodies
//!
//! [`merge`] produces the renderable text of a document from its unmerged
//! body, the placeholder registry and the current image resolutions. It is
//! pure and total: anything it cannot substitute is left in a visible
//! degraded form instead of being reported as an error.
//!
//! # Substitution rules
//!
//! | Dialect  | Resolved                              | Unresolved                         |
//! |----------|---------------------------------------|------------------------------------|
//! | Markdown | `![desc](image:id)` → `![desc](url)`  | → `[Image Placeholder: desc]`      |
//! | HTML     | `src="image:id"` → `src="url"`        | left as `src="image:id"`           |
//!
//! References to ids the registry does not know are passed through verbatim.
//! Substitution is textual and happens before any parsing; the render
//! surface parses the merged text afterwards.

use crate::document_model::{
    Dialect, Document, ImagePayload, ImageStore, PlaceholderId, PlaceholderRegistry,
};
use itertools::Itertools;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// A merged document ready for the render surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableDocument {
    /// Dialect of the source document
    pub dialect: Dialect,
    /// Merged text
    pub body: String,
    /// What the merge did with each image reference
    pub summary: MergeSummary,
}

/// Counts of image references by how the merge handled them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// References replaced with a resolved payload
    pub resolved: usize,
    /// References to known placeholders with no payload yet
    pub unresolved: usize,
    /// References the merge did not recognise and left verbatim
    pub passthrough: usize,
}

/// Merge image resolutions into a document body
///
/// # Parameters
/// * `document` - The unmerged document
/// * `registry` - Placeholders produced with the document
/// * `images` - Current resolutions
///
/// # Returns
/// * `RenderableDocument` - The merged text, never an error
pub fn merge(
    document: &Document,
    registry: &PlaceholderRegistry,
    images: &ImageStore,
) -> RenderableDocument {
    let (body, summary) = match document {
        Document::Markdown(body) => merge_markdown(body, registry, images),
        Document::Html(body) => merge_html(body, registry, images),
    };

    log::debug!(
        "Merged {} document: {} resolved, {} unresolved, {} passed through",
        document.dialect(),
        summary.resolved,
        summary.unresolved,
        summary.passthrough
    );

    RenderableDocument {
        dialect: document.dialect(),
        body,
        summary,
    }
}

/// Placeholder ids referenced by a document, in order of first appearance
pub fn referenced_ids(document: &Document) -> Vec<PlaceholderId> {
    reference_pattern(document.dialect())
        .captures_iter(document.body())
        .map(|caps| PlaceholderId::new(&caps[1]))
        .unique()
        .collect()
}

fn reference_pattern(dialect: Dialect) -> &'static Regex {
    static MARKDOWN: OnceLock<Regex> = OnceLock::new();
    static HTML: OnceLock<Regex> = OnceLock::new();

    match dialect {
        Dialect::Markdown => MARKDOWN.get_or_init(|| {
            Regex::new(r"!\[[^\]]*\]\(image:([^)\s]+)\)").expect("valid markdown reference pattern")
        }),
        Dialect::Html => HTML.get_or_init(|| {
            Regex::new(r#"src="image:([^"]+)""#).expect("valid html reference pattern")
        }),
    }
}

/// Substitute `src="image:<id>"` attributes
fn merge_html(
    body: &str,
    registry: &PlaceholderRegistry,
    images: &ImageStore,
) -> (String, MergeSummary) {
    let mut summary = MergeSummary::default();
    for caps in reference_pattern(Dialect::Html).captures_iter(body) {
        let id = &caps[1];
        if !registry.contains(id) {
            summary.passthrough += 1;
        } else if images.is_resolved(id) {
            summary.resolved += 1;
        } else {
            summary.unresolved += 1;
        }
    }

    let mut merged = body.to_string();
    for (id, _) in registry.iter() {
        let Some(payload) = images.get(id.as_str()) else {
            continue;
        };
        let attribute = format!("src=\"image:{}\"", id);
        if merged.contains(&attribute) {
            merged = merged.replace(
                &attribute,
                &format!("src=\"{}\"", html_attribute_value(payload)),
            );
        }
    }

    (merged, summary)
}

/// Substitute `![<description>](image:<id>)` constructs
fn merge_markdown(
    body: &str,
    registry: &PlaceholderRegistry,
    images: &ImageStore,
) -> (String, MergeSummary) {
    let mut summary = MergeSummary::default();
    let mut merged = Cow::Borrowed(body);

    for (id, description) in registry.iter() {
        let pattern = format!(
            r"!\[{}\]\(image:{}\)",
            regex::escape(description),
            regex::escape(id.as_str())
        );
        let matcher = match Regex::new(&pattern) {
            Ok(matcher) => matcher,
            Err(e) => {
                log::warn!("Skipping placeholder {}: cannot build matcher: {}", id, e);
                continue;
            }
        };

        let replacement = match images.get(id.as_str()) {
            Some(payload) => format!("![{}]({})", description, markdown_destination(payload)),
            None => format!("[Image Placeholder: {}]", description),
        };

        let replacement = replacement.as_str();
        let mut count = 0;
        let replaced = matcher.replace_all(&merged, |_: &Captures<'_>| {
            count += 1;
            replacement
        });
        if count == 0 {
            continue;
        }
        let replaced = replaced.into_owned();
        merged = Cow::Owned(replaced);

        if images.is_resolved(id.as_str()) {
            summary.resolved += count;
        } else {
            summary.unresolved += count;
        }
    }

    let merged = merged.into_owned();
    summary.passthrough = reference_pattern(Dialect::Markdown)
        .find_iter(&merged)
        .count();

    (merged, summary)
}

/// Make a payload safe to sit inside a double-quoted attribute
fn html_attribute_value(payload: &ImagePayload) -> Cow<'_, str> {
    let value = payload.as_str();
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Make a payload safe to sit inside a markdown link destination
fn markdown_destination(payload: &ImagePayload) -> Cow<'_, str> {
    let value = payload.as_str();
    if !value.contains([' ', '(', ')', '<', '>', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '(' => encoded.push_str("%28"),
            ')' => encoded.push_str("%29"),
            '<' => encoded.push_str("%3C"),
            '>' => encoded.push_str("%3E"),
            '\n' => encoded.push_str("%0A"),
            '\r' => encoded.push_str("%0D"),
            '\t' => encoded.push_str("%09"),
            other => encoded.push(other),
        }
    }
    Cow::Owned(encoded)
}
