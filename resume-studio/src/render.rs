//! Render surface for merged documents
//!
//! Turns a [`RenderableDocument`] into preview HTML:
//! - Markdown is parsed and rendered with raw HTML neutralised
//! - HTML is placed inside a sandboxed frame with scripting disabled
//!
//! The preview is recomputed from scratch on every state change; documents
//! are resume length so there is no incremental patching.

use crate::document_model::Dialect;
use crate::merge::RenderableDocument;

mod html;
mod markdown;

pub use html::{render_sandboxed, FRAME_CONTENT_POLICY};
pub use markdown::render_markdown;

/// Preview markup for one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    dialect: Dialect,
    html: String,
}

impl RenderedPreview {
    /// Dialect the preview was rendered from
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Preview markup, suitable for embedding in a host page
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Wrap the preview into a standalone HTML page
    ///
    /// # Parameters
    /// * `title` - Page title (escaped)
    ///
    /// # Returns
    /// * `String` - A complete HTML document
    pub fn to_page(&self, title: &str) -> String {
        let variant = match self.dialect {
            Dialect::Markdown => "markdown",
            Dialect::Html => "html",
        };

        let mut page = page_head(title);
        page.push_str("<body>\n<div class=\"container\">\n");
        page.push_str(&format!("<div class=\"preview-page preview-{}\">\n", variant));
        page.push_str(&self.html);
        page.push_str("</div>\n</div>\n</body>\n</html>\n");
        page
    }
}

/// Render a merged document for preview
pub fn render(document: &RenderableDocument) -> RenderedPreview {
    let html = match document.dialect {
        Dialect::Markdown => render_markdown(&document.body),
        Dialect::Html => render_sandboxed(&document.body),
    };

    RenderedPreview {
        dialect: document.dialect,
        html,
    }
}

/// Doctype, head and stylesheet of a preview page
fn page_head(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n",
        escape_html(title),
        CSS_STYLES
    )
}

/// Escape text for element content and double-quoted attributes
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Preview page styling
const CSS_STYLES: &str = r#"
*, *::before, *::after { box-sizing: border-box; }

html { background: #eef0f3; }

body {
    margin: 0;
    padding: 32px 16px;
    font: 15px/1.55 "Inter", "Helvetica Neue", Arial, "PingFang SC", sans-serif;
    color: #222831;
}

.container { max-width: 820px; margin: 0 auto; }

/* A4-ish sheet */
.preview-page {
    background: #fff;
    min-height: 1160px;
    padding: 56px 64px;
    border: 1px solid #dde1e6;
    box-shadow: 0 6px 18px rgba(20, 30, 45, 0.08);
}

.preview-page.preview-html { padding: 0; }

.html-preview { display: block; width: 100%; min-height: 1160px; border: 0; }

.preview-page h1 {
    margin: 0 0 4px;
    font-size: 30px;
    letter-spacing: 0.01em;
}

.preview-page h2 {
    margin: 28px 0 10px;
    font-size: 17px;
    text-transform: uppercase;
    letter-spacing: 0.08em;
    color: #2f5d8a;
    border-bottom: 2px solid #2f5d8a;
    padding-bottom: 3px;
}

.preview-page h3 { margin: 18px 0 4px; font-size: 15px; }

.preview-page p, .preview-page ul, .preview-page ol { margin: 0 0 10px; }

.preview-page ul, .preview-page ol { padding-left: 22px; }

/* portraits and logos stay small */
.preview-page img { max-width: 160px; max-height: 200px; object-fit: cover; }

.preview-page table { width: 100%; border-collapse: collapse; margin: 0 0 12px; }

.preview-page td, .preview-page th { padding: 4px 8px; vertical-align: top; text-align: left; }

.preview-page a { color: #2f5d8a; }

@media print {
    html, body { background: none; padding: 0; }
    .preview-page { border: 0; box-shadow: none; padding: 0; }
}
"#;
