// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! commitnote-claude: note synthesis for commitnote
//!
//! This library crate turns a [`ChangeWindow`](commitnote_git::ChangeWindow)
//! into a [`Note`] by prompting the Anthropic Messages API and parsing the
//! `TITLE:` / `CONTENT:` layout out of the reply.

#![warn(missing_docs)]

//! ## Response Layout
//!
//! The model is asked to answer with:
//!
//! ```text
//! TITLE: <one line title>
//! CONTENT:
//! <markdown body>
//! ```
//!
//! Anything else is rejected by [`parse_note`] with [`SynthError::Parse`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use commitnote_claude::{ClaudeSynthesizer, NoteSynthesizer, SynthConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let window = commitnote_git::inspect(".", 1)?;
//! let synthesizer = ClaudeSynthesizer::new(SynthConfig::default())?;
//! let note = synthesizer.synthesize(&window).await?;
//! println!("{}", note.title());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod note;
pub mod prompt;

pub use client::{
    ClaudeSynthesizer, DEFAULT_API_BASE, DEFAULT_API_KEY_ENV, DEFAULT_LANGUAGE, DEFAULT_MODEL,
    DEFAULT_TIMEOUT, NoteSynthesizer, SynthConfig,
};
#[cfg(any(test, feature = "test-util"))]
pub use client::StaticSynthesizer;
pub use error::SynthError;
pub use note::{CONTENT_MARKER, Note, TITLE_MARKER, parse_note};
pub use prompt::build_prompt;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{ClaudeSynthesizer, NoteSynthesizer, SynthConfig};
    pub use crate::error::SynthError;
    pub use crate::note::{Note, parse_note};
}
