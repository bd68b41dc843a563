use resume_studio::document_model::{Dialect, Document, ImagePayload, ImageStore, PlaceholderRegistry};
use resume_studio::merge::merge;
use resume_studio::render::render;
use resume_studio::service::GeneratedResume;
use serde_json::json;

fn response(value: serde_json::Value) -> (Document, PlaceholderRegistry) {
    let response: GeneratedResume = serde_json::from_value(value).unwrap();
    response.into_parts().unwrap()
}

#[test]
fn test_unresolved_markdown_placeholder_preview() {
    let (document, registry) = response(json!({
        "id": 7,
        "markdown_content": "# Jane Doe\n\n![portrait](image:p1)\n",
        "image_placeholders": {"p1": "portrait"}
    }));

    let merged = merge(&document, &registry, &ImageStore::new());
    assert_eq!(merged.body, "# Jane Doe\n\n[Image Placeholder: portrait]\n");

    let preview = render(&merged);
    assert!(preview.html().contains("<h1>Jane Doe</h1>"));
    assert!(preview.html().contains("[Image Placeholder: portrait]"));
    assert!(!preview.html().contains("<img"));
}

#[test]
fn test_resolved_markdown_placeholder_preview() {
    let (document, registry) = response(json!({
        "markdown_content": "![portrait](image:p1)",
        "image_placeholders": {"p1": "portrait"}
    }));
    let mut images = ImageStore::new();
    images.set("p1".into(), ImagePayload::from_reference("https://cdn/x.png"));

    let merged = merge(&document, &registry, &images);
    assert_eq!(merged.body, "![portrait](https://cdn/x.png)");
    assert_eq!(merged.summary.resolved, 1);

    let preview = render(&merged);
    assert!(preview.html().contains("src=\"https://cdn/x.png\""));
    assert!(preview.html().contains("alt=\"portrait\""));
}

#[test]
fn test_html_draft_is_sandboxed() {
    let (document, registry) = response(json!({
        "html_content": "<img src=\"image:p1\" alt=\"logo\"><script>alert(1)</script>",
        "image_placeholders": {"p1": "logo"}
    }));
    assert_eq!(document.dialect(), Dialect::Html);

    let mut images = ImageStore::new();
    images.set("p1".into(), ImagePayload::from_bytes(&[0x47, 0x49, 0x46, 0x38, 0x39, 0x61]));

    let merged = merge(&document, &registry, &images);
    assert!(merged.body.starts_with("<img src=\"data:"));
    assert!(!merged.body.contains("image:p1"));

    let preview = render(&merged);
    let html = preview.html();
    assert!(html.starts_with("<iframe"));
    assert!(html.contains("sandbox=\"\""));
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn test_unknown_reference_passes_through() {
    let (document, registry) = response(json!({
        "markdown_content": "![x](image:p9)",
        "image_placeholders": {"p1": "portrait"}
    }));

    let merged = merge(&document, &registry, &ImageStore::new());
    assert_eq!(merged.body, "![x](image:p9)");
    assert_eq!(merged.summary.passthrough, 1);
}

#[test]
fn test_preview_page_is_standalone() {
    let (document, registry) = response(json!({
        "markdown_content": "Plain <b>text</b>",
        "image_placeholders": {}
    }));

    let page = render(&merge(&document, &registry, &ImageStore::new())).to_page("Jane & Co");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Jane &amp; Co</title>"));
    assert!(page.contains("preview-markdown"));
    assert!(!page.contains("<b>text</b>"));
}

#[test]
fn test_avif_upload_renders_as_image() {
    let (document, registry) = response(json!({
        "markdown_content": "![portrait](image:p1)",
        "image_placeholders": {"p1": "portrait"}
    }));
    let avif = [
        0x00, 0x00, 0x00, 0x1C, b'f', b't', b'y', b'p', b'a', b'v', b'i', b'f', 0x00, 0x00, 0x00,
        0x00, b'm', b'i', b'f', b'1', b'm', b'i', b'a', b'f',
    ];
    let mut images = ImageStore::new();
    images.set("p1".into(), ImagePayload::from_bytes(&avif));

    let merged = merge(&document, &registry, &images);
    assert!(merged.body.starts_with("![portrait](data:image/avif;base64,"));

    let preview = render(&merged);
    assert!(preview.html().contains("src=\"data:image/avif;base64,"));
    assert!(!preview.html().contains("src=\"\""));
}
