//! Synthesized notes and the response layout parser

use crate::error::SynthError;
use serde::Serialize;

/// Marker preceding the title line
pub const TITLE_MARKER: &str = "TITLE:";
/// Marker preceding the markdown body
pub const CONTENT_MARKER: &str = "CONTENT:";

/// A synthesized note: a single-line title and a markdown body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    title: String,
    body: String,
}

impl Note {
    /// Build a note, trimming both parts
    ///
    /// # Errors
    ///
    /// Returns `SynthError::Parse` if the title is empty or spans several
    /// lines, or if the body is empty.
    pub fn new(title: impl AsRef<str>, body: impl AsRef<str>) -> Result<Self, SynthError> {
        let title = title.as_ref().trim();
        let body = body.as_ref().trim();

        if title.is_empty() {
            return Err(SynthError::Parse("title is empty".to_string()));
        }
        if title.contains(['\n', '\r']) {
            return Err(SynthError::Parse("title spans multiple lines".to_string()));
        }
        if body.is_empty() {
            return Err(SynthError::Parse("content is empty".to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }

    /// The note title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The markdown body
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Parse the `TITLE:` / `CONTENT:` layout out of generated text
///
/// The title is the text after the first `TITLE:` up to the end of that
/// line. The body is everything after the first `CONTENT:` that follows the
/// title line. Both are trimmed.
///
/// # Errors
///
/// Returns `SynthError::Parse` when either marker is missing, the markers
/// are out of order, or the title or body is empty.
pub fn parse_note(text: &str) -> Result<Note, SynthError> {
    let title_start = text
        .find(TITLE_MARKER)
        .ok_or_else(|| SynthError::Parse(format!("missing {TITLE_MARKER} marker")))?;
    let after_title = &text[title_start + TITLE_MARKER.len()..];

    let (title, rest) = match after_title.find('\n') {
        Some(end) => (&after_title[..end], &after_title[end + 1..]),
        None => (after_title, ""),
    };

    let content_start = rest.find(CONTENT_MARKER).ok_or_else(|| {
        SynthError::Parse(format!("missing {CONTENT_MARKER} marker after the title"))
    })?;
    let body = &rest[content_start + CONTENT_MARKER.len()..];

    Note::new(title, body)
}
