//! Content rendering.
//!
//! Dispatch is purely on the document name's extension: plain text passes
//! through verbatim, markdown becomes HTML. Anything else is refused rather
//! than guessed at.

use pulldown_cmark::{Options, Parser, html};

use crate::document::DocumentKind;
use crate::error::RenderError;

/// How rendered content must be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Serve as `text/plain`, body verbatim.
    PlainText,
    /// Raw HTML to embed in a page. Must not be escaped again.
    Html,
}

/// The output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub kind: ContentKind,
    pub body: String,
}

/// Pick the content kind for a document name, if it has a renderer.
#[must_use]
pub fn classify(name: &str) -> Option<ContentKind> {
    DocumentKind::from_name(name).map(|kind| match kind {
        DocumentKind::Text => ContentKind::PlainText,
        DocumentKind::Markdown => ContentKind::Html,
    })
}

/// Render a document's bytes for display.
///
/// Bytes that are not valid UTF-8 are decoded lossily.
///
/// # Errors
///
/// Returns [`RenderError::Unsupported`] when the extension is neither
/// `.txt` nor `.md`.
pub fn render(name: &str, bytes: &[u8]) -> Result<RenderedContent, RenderError> {
    let kind = classify(name).ok_or_else(|| RenderError::Unsupported {
        name: name.to_owned(),
    })?;

    let text = String::from_utf8_lossy(bytes);
    let body = match kind {
        ContentKind::PlainText => text.into_owned(),
        ContentKind::Html => render_markdown(&text),
    };

    Ok(RenderedContent { kind, body })
}

/// Render markdown to an HTML fragment.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
