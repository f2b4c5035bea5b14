//! commitnote library
//!
//! This module exports the note pipeline for use by the binary, in
//! integration tests and as a library. A run inspects the newest commits of a
//! source repository, classifies them into tags, asks the text-generation
//! service for a note, and writes it as a front-matter markdown file into a
//! content repository.

pub mod config;
pub mod emit;
pub mod history;
pub mod pipeline;
pub mod tags;

pub use config::{Config, ConfigError};
pub use emit::{EmitError, EmittedNote, Emitter, PlannedNote};
pub use history::{HistoryError, HistoryStore, RunHistory};
pub use pipeline::{
    Clock, CommitStatus, FixedClock, Pipeline, PipelineError, RunOutcome, RunReport, RunRequest,
    SkipReason, SystemClock,
};
pub use tags::{Classifier, TagError, TagSet};
