//! The document body and its dialect

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body format governing substitution and rendering rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Markdown with `![description](image:<id>)` references
    Markdown,
    /// HTML with `src="image:<id>"` attributes
    Html,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "Markdown"),
            Self::Html => write!(f, "HTML"),
        }
    }
}

/// A resume body in exactly one dialect
///
/// The dialect is fixed by whichever generation produced the body and is
/// never detected from content. On the wire the body serializes under the
/// field the service uses for that dialect (`markdown_content` or
/// `html_content`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Document {
    /// Markdown body
    #[serde(rename = "markdown_content")]
    Markdown(String),
    /// HTML body
    #[serde(rename = "html_content")]
    Html(String),
}

impl Document {
    /// Create a document in the given dialect
    pub fn new(dialect: Dialect, body: impl Into<String>) -> Self {
        match dialect {
            Dialect::Markdown => Self::Markdown(body.into()),
            Dialect::Html => Self::Html(body.into()),
        }
    }

    /// The document's dialect
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Markdown(_) => Dialect::Markdown,
            Self::Html(_) => Dialect::Html,
        }
    }

    /// The raw, unmerged body
    pub fn body(&self) -> &str {
        match self {
            Self::Markdown(body) | Self::Html(body) => body,
        }
    }

    /// Whether the body holds nothing but whitespace
    pub fn is_empty(&self) -> bool {
        self.body().trim().is_empty()
    }

    /// A new document with the same dialect and a replaced body
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self::new(self.dialect(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_dialect_and_body() {
        let doc = Document::new(Dialect::Html, "<p>hi</p>");
        assert_eq!(doc.dialect(), Dialect::Html);
        assert_eq!(doc.body(), "<p>hi</p>");
    }

    #[test]
    fn test_with_body_preserves_dialect() {
        let doc = Document::Markdown("# Old".to_string());
        let edited = doc.with_body("# New");
        assert_eq!(edited, Document::Markdown("# New".to_string()));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(Document::Markdown("  \n\t".to_string()).is_empty());
        assert!(!Document::Html("<p></p>".to_string()).is_empty());
    }

    #[test]
    fn test_serializes_under_dialect_field() {
        let json = serde_json::to_value(Document::Html("<p/>".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"html_content": "<p/>"}));

        let json = serde_json::to_value(Document::Markdown("# A".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"markdown_content": "# A"}));
    }
}
