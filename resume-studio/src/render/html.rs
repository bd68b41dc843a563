//! Sandboxed HTML preview
//!
//! The HTML body may come from an AI service and can contain adversarial
//! markup. It is never inlined into the host page: it becomes the `srcdoc`
//! of an `<iframe>` whose empty `sandbox` attribute disables scripts, forms,
//! popups, same-origin access and top-level navigation.

use super::escape_html;

/// Content-Security-Policy applied inside the preview frame
///
/// Images and inline styles load; scripts, frames and network fetches do not.
pub const FRAME_CONTENT_POLICY: &str = "default-src 'none'; img-src data: http: https:; \
     style-src 'unsafe-inline' http: https:; font-src data: http: https:";

/// Embed merged HTML in an inert sandboxed frame
///
/// # Parameters
/// * `markup` - Merged HTML, either a fragment or a complete document
///
/// # Returns
/// * `String` - An `<iframe>` element carrying the escaped markup as `srcdoc`
pub fn render_sandboxed(markup: &str) -> String {
    let policy = format!(
        "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">",
        FRAME_CONTENT_POLICY
    );

    let frame_document = if is_full_document(markup) {
        let at = policy_position(markup);
        format!("{}\n{}\n{}", &markup[..at], policy, &markup[at..])
    } else {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n{}\n</head>\n<body>\n{}\n</body>\n</html>",
            policy, markup
        )
    };

    format!(
        "<iframe class=\"html-preview\" title=\"Resume preview\" sandbox=\"\" \
         referrerpolicy=\"no-referrer\" srcdoc=\"{}\"></iframe>\n",
        escape_html(&frame_document)
    )
}

fn is_full_document(markup: &str) -> bool {
    let head: String = markup
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Byte offset right after the tag that should precede the policy meta
///
/// The meta goes inside `<head>`. Without a head it follows `<html>`, and
/// without either it follows the doctype, so the doctype stays first.
fn policy_position(markup: &str) -> usize {
    let lower = markup.to_ascii_lowercase();
    ["head", "html", "!doctype"]
        .iter()
        .find_map(|tag| tag_end(&lower, tag))
        .unwrap_or(0)
}

/// End offset of the first `<tag ...>` opening tag in lowercased markup
fn tag_end(lower: &str, tag: &str) -> Option<usize> {
    let needle = format!("<{}", tag);
    let mut from = 0;
    while let Some(found) = lower[from..].find(&needle) {
        let name_end = from + found + needle.len();
        let boundary = lower[name_end..].chars().next();
        if matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            return lower[name_end..].find('>').map(|close| name_end + close + 1);
        }
        from = name_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_sandboxed_without_scripts() {
        let html = render_sandboxed("<p>Hello</p>");
        assert!(html.starts_with("<iframe"));
        assert!(html.contains("sandbox=\"\""));
        assert!(!html.contains("allow-scripts"));
        assert!(!html.contains("allow-top-navigation"));
        assert!(!html.contains("allow-same-origin"));
    }

    #[test]
    fn test_markup_is_attribute_escaped() {
        let html = render_sandboxed("<script>alert(\"x\")</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"));
    }

    #[test]
    fn test_fragment_is_wrapped_with_policy() {
        let html = render_sandboxed("<p>Hi</p>");
        assert!(html.contains("&lt;body&gt;\n&lt;p&gt;Hi&lt;/p&gt;"));
        assert!(html.contains("Content-Security-Policy"));
        assert!(html.contains("default-src &#39;none&#39;"));
    }

    #[test]
    fn test_full_document_keeps_its_structure() {
        let html = render_sandboxed("<!DOCTYPE html><html><body><p>Hi</p></body></html>");
        assert_eq!(html.matches("&lt;html&gt;").count(), 1);
        assert!(html.contains("Content-Security-Policy"));
        assert!(html.contains("srcdoc=\"&lt;!DOCTYPE html&gt;&lt;html&gt;\n&lt;meta http-equiv"));
    }

    #[test]
    fn test_policy_goes_inside_head() {
        let html = render_sandboxed(
            "<!DOCTYPE html>\n<html lang=\"zh\"><head><title>CV</title></head><body><header>Jane</header></body></html>",
        );
        assert!(html.contains("srcdoc=\"&lt;!DOCTYPE html&gt;"));
        assert!(html.contains("&lt;head&gt;\n&lt;meta http-equiv=&quot;Content-Security-Policy&quot;"));
        assert!(!html.contains("&lt;header&gt;\n&lt;meta"));
    }

    #[test]
    fn test_policy_position() {
        assert_eq!(policy_position("<!DOCTYPE html><p>x</p>"), 15);
        assert_eq!(policy_position("<html><body></body></html>"), 6);
        assert_eq!(policy_position("<html><HEAD id=\"h\"></HEAD></html>"), 19);
        assert_eq!(policy_position("<html><header></header></html>"), 6);
    }

    #[test]
    fn test_is_full_document() {
        assert!(is_full_document("  <!DOCTYPE html><html></html>"));
        assert!(is_full_document("<HTML lang=\"en\">"));
        assert!(!is_full_document("<div>resume</div>"));
    }
}
