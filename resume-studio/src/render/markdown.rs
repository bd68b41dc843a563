//! Markdown preview rendering
//!
//! Walks pulldown-cmark's event stream and renders it to HTML. Raw HTML in
//! the source is emitted as escaped text, and link or image destinations
//! with script-capable schemes are neutralised.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Render markdown to preview HTML
///
/// # Parameters
/// * `text` - Merged markdown text
///
/// # Returns
/// * `String` - HTML fragment without any raw markup from the source
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(text, options).map(neutralize_event);

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

/// Rewrite a single event so it cannot carry executable content
fn neutralize_event(event: Event<'_>) -> Event<'_> {
    match event {
        // Raw HTML is shown as text rather than interpreted
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),

        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_link_destination(dest_url),
            title,
            id,
        }),

        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_image_source(dest_url),
            title,
            id,
        }),

        other => other,
    }
}

/// Lowercased URL scheme including the colon, if the destination has one
fn scheme(dest: &str) -> Option<String> {
    let dest = dest.trim_start();
    let colon = dest.find(':')?;
    let candidate = &dest[..colon];
    if candidate.is_empty()
        || !candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }
    Some(format!("{}:", candidate.to_ascii_lowercase()))
}

fn safe_link_destination(dest: CowStr<'_>) -> CowStr<'_> {
    match scheme(&dest).as_deref() {
        Some("javascript:" | "vbscript:" | "data:") => {
            log::debug!("Neutralised link destination with unsafe scheme");
            CowStr::Borrowed("#")
        }
        _ => dest,
    }
}

fn safe_image_source(dest: CowStr<'_>) -> CowStr<'_> {
    match scheme(&dest).as_deref() {
        Some("javascript:" | "vbscript:") => CowStr::Borrowed(""),
        Some("data:") if !dest.trim_start()[5..].to_ascii_lowercase().starts_with("image/") => {
            CowStr::Borrowed("")
        }
        _ => dest,
    }
}
