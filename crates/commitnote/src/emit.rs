// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Note file emission
//!
//! Turns a synthesized [`Note`] into a markdown file with YAML front matter
//! inside the notes directory. Files are created with create-new semantics:
//! an existing file is never touched, a colliding name gets a random suffix.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use commitnote_claude::Note;
use commitnote_git::ChangeWindow;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::tags::TagSet;

/// Layout reference written into every note's front matter
pub const DEFAULT_LAYOUT: &str = "../../layouts/NoteLayout.astro";
/// Length of the collision suffix
pub const SUFFIX_LEN: usize = 6;
/// Maximum number of title words used in a slug
pub const SLUG_WORDS: usize = 3;

const MAX_COLLISION_ATTEMPTS: usize = 16;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("word pattern is valid"));

/// Emission errors
#[derive(Debug, Error)]
pub enum EmitError {
    /// The notes directory or note file could not be written
    #[error("Failed to write note {path}: {source}")]
    Io {
        /// The path being written
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Every candidate file name was already taken
    #[error("No free file name for slug {slug} after {attempts} attempts")]
    CollisionsExhausted {
        /// The slug that kept colliding
        slug: String,
        /// Number of names tried
        attempts: usize,
    },
}

/// A note rendered and named, but not yet written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedNote {
    /// Slug derived from the title
    pub slug: String,
    /// File name without collision suffix
    pub file_name: String,
    /// Full file content
    pub markdown: String,
}

/// A note that was written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedNote {
    /// File name actually used
    pub file_name: String,
    /// Full path of the written file
    pub path: PathBuf,
    /// Whether a collision suffix was needed
    pub suffixed: bool,
}

/// Derive a filesystem-safe slug from a title
///
/// Uses the first [`SLUG_WORDS`] ASCII alphabetic words, lower-cased and
/// joined by `-`. Titles with fewer than two such words fall back to
/// `note-<change_id>`.
#[must_use]
pub fn slugify(title: &str, change_id: &str) -> String {
    let words: Vec<&str> = WORD_PATTERN
        .find_iter(title)
        .map(|m| m.as_str())
        .collect();

    if words.len() >= 2 {
        words
            .iter()
            .take(SLUG_WORDS)
            .map(|word| word.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    } else {
        format!("note-{change_id}")
    }
}

/// `<YYYY-MM-DD>-<slug>[-<suffix>].md`
#[must_use]
pub fn note_file_name(now: DateTime<Utc>, slug: &str, suffix: Option<&str>) -> String {
    let date = now.format("%Y-%m-%d");
    match suffix {
        Some(suffix) => format!("{date}-{slug}-{suffix}.md"),
        None => format!("{date}-{slug}.md"),
    }
}

/// Render front matter and body
#[must_use]
pub fn render_note(
    note: &Note,
    tags: &TagSet,
    window: &ChangeWindow,
    layout: &str,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&format!("layout: {layout}\n"));
    out.push_str(&format!("title: {}\n", yaml_string(note.title())));
    out.push_str(&format!("date: {}\n", now.format("%Y-%m-%dT%H:%M")));
    if tags.is_empty() {
        out.push_str("tags: []\n");
    } else {
        out.push_str("tags:\n");
        for tag in tags.iter() {
            out.push_str(&format!("  - {tag}\n"));
        }
    }
    out.push_str(&format!("source: {}\n", yaml_string(&window.repo_name)));
    out.push_str("autoGenerated: true\n");
    out.push_str("---\n\n");
    out.push_str(note.body());
    out.push('\n');
    out
}

/// Double-quoted YAML scalar; JSON string syntax is a subset of it
fn yaml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "'")))
}

/// Fill a freshly created note file, removing it again if writing fails
fn write_new_file<W: Write>(mut file: W, path: &Path, contents: &[u8]) -> Result<(), EmitError> {
    if let Err(source) = file.write_all(contents).and_then(|()| file.flush()) {
        drop(file);
        if let Err(err) = fs::remove_file(path) {
            debug!(path = %path.display(), error = %err, "could not remove partial note");
        }
        return Err(EmitError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

/// Writes note files into a notes directory
#[derive(Debug, Clone)]
pub struct Emitter {
    notes_dir: PathBuf,
    layout: String,
}

impl Emitter {
    /// Create an emitter writing into `notes_dir` with the default layout
    #[must_use]
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }

    /// Use a different layout reference
    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Name and render a note without touching the filesystem
    #[must_use]
    pub fn plan(
        &self,
        note: &Note,
        tags: &TagSet,
        window: &ChangeWindow,
        now: DateTime<Utc>,
    ) -> PlannedNote {
        let slug = slugify(note.title(), &window.change_id);
        PlannedNote {
            file_name: note_file_name(now, &slug, None),
            markdown: render_note(note, tags, window, &self.layout, now),
            slug,
        }
    }

    /// Write a note as a new file and return where it landed
    ///
    /// # Errors
    ///
    /// Returns `EmitError::Io` if the directory or file cannot be written and
    /// `EmitError::CollisionsExhausted` if no free name is found.
    pub fn emit(
        &self,
        note: &Note,
        tags: &TagSet,
        window: &ChangeWindow,
        now: DateTime<Utc>,
    ) -> Result<EmittedNote, EmitError> {
        let plan = self.plan(note, tags, window, now);
        self.write_planned(&plan, now)
    }

    /// Write an already planned note
    ///
    /// # Errors
    ///
    /// See [`Emitter::emit`].
    pub fn write_planned(
        &self,
        plan: &PlannedNote,
        now: DateTime<Utc>,
    ) -> Result<EmittedNote, EmitError> {
        fs::create_dir_all(&self.notes_dir).map_err(|source| EmitError::Io {
            path: self.notes_dir.clone(),
            source,
        })?;

        let mut file_name = plan.file_name.clone();
        for attempt in 0..MAX_COLLISION_ATTEMPTS {
            let path = self.notes_dir.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_new_file(file, &path, plan.markdown.as_bytes())?;
                    return Ok(EmittedNote {
                        file_name,
                        path,
                        suffixed: attempt > 0,
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    let suffix = random_suffix();
                    debug!(existing = %file_name, %suffix, "note file exists, adding suffix");
                    file_name = note_file_name(now, &plan.slug, Some(&suffix));
                }
                Err(source) => return Err(EmitError::Io { path, source }),
            }
        }

        Err(EmitError::CollisionsExhausted {
            slug: plan.slug.clone(),
            attempts: MAX_COLLISION_ATTEMPTS,
        })
    }
}
