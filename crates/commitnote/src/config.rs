//! Configuration for the commitnote CLI
//!
//! This module provides the command-line surface, including the source
//! repository, the content repository layout, text-generation settings and
//! logging options.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use commitnote_claude::{
    DEFAULT_API_BASE, DEFAULT_API_KEY_ENV, DEFAULT_LANGUAGE, DEFAULT_MODEL, SynthConfig,
};

use crate::history::HISTORY_FILE_NAME;
use crate::pipeline::RunRequest;

/// Default notes directory, relative to the content root
pub const DEFAULT_NOTES_DIR: &str = "src/pages/notes";

/// Commitnote - turn recent commits into timestamped technical notes
#[derive(Parser, Debug, Clone)]
#[command(name = "commitnote")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to the source git repository to summarize
    #[arg(short, long, env = "COMMITNOTE_REPO")]
    pub repo: PathBuf,

    /// Number of recent commits to include in the window
    #[arg(short = 'n', long, default_value_t = 1, value_parser = parse_commits)]
    pub commits: usize,

    /// Print the rendered note instead of writing it
    ///
    /// No file is written and the history is left untouched.
    #[arg(long, visible_alias = "preview", default_value = "false")]
    pub dry_run: bool,

    /// Commit the written note into the content repository
    #[arg(long, default_value = "false")]
    pub auto_commit: bool,

    /// Root of the content repository
    ///
    /// Defaults to the current working directory.
    #[arg(long, env = "COMMITNOTE_CONTENT_ROOT")]
    pub content_root: Option<PathBuf>,

    /// Notes directory, relative to the content root
    #[arg(long, default_value = DEFAULT_NOTES_DIR)]
    pub notes_dir: PathBuf,

    /// Model identifier for the Messages API
    #[arg(long, env = "COMMITNOTE_MODEL")]
    pub model: Option<String>,

    /// Base URL of the Messages API
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub api_base: Option<String>,

    /// Name of the environment variable holding the API key
    #[arg(long, default_value = DEFAULT_API_KEY_ENV)]
    pub api_key_env: String,

    /// Language the note is written in
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// HTTP timeout for the text-generation request, in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so stdout only carries the note output.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            commits: 1,
            dry_run: false,
            auto_commit: false,
            content_root: None,
            notes_dir: PathBuf::from(DEFAULT_NOTES_DIR),
            model: None,
            api_base: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: 60,
            verbose: false,
            quiet: false,
        }
    }
}

fn parse_commits(value: &str) -> Result<usize, String> {
    let commits: usize = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if commits == 0 {
        return Err("the commit window must include at least one commit".to_string());
    }
    Ok(commits)
}

impl Config {
    /// Get the content root, using the current directory as default
    #[must_use]
    pub fn content_root(&self) -> PathBuf {
        self.content_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Directory notes are written to
    #[must_use]
    pub fn notes_dir(&self) -> PathBuf {
        self.content_root().join(&self.notes_dir)
    }

    /// Location of the run history file
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.content_root().join(HISTORY_FILE_NAME)
    }

    /// Text-generation settings derived from the flags
    #[must_use]
    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig {
            api_key_env: self.api_key_env.clone(),
            api_base: self
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(self.timeout_secs),
            language: self.language.clone(),
            ..SynthConfig::default()
        }
    }

    /// The run described by the flags
    #[must_use]
    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            repo: self.repo.clone(),
            commits: self.commits,
            dry_run: self.dry_run,
            auto_commit: self.auto_commit,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The repository or content root doesn't exist or isn't a directory
    /// - The commit window is empty
    /// - The timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.repo.exists() {
            return Err(ConfigError::RepoNotFound(self.repo.clone()));
        }
        if !self.repo.is_dir() {
            return Err(ConfigError::RepoNotDirectory(self.repo.clone()));
        }

        let content_root = self.content_root();
        if !content_root.exists() {
            return Err(ConfigError::ContentRootNotFound(content_root));
        }
        if !content_root.is_dir() {
            return Err(ConfigError::ContentRootNotDirectory(content_root));
        }

        if self.commits == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Repository path not found
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    /// Repository path is not a directory
    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),

    /// Content root not found
    #[error("Content root not found: {0}")]
    ContentRootNotFound(PathBuf),

    /// Content root is not a directory
    #[error("Content root is not a directory: {0}")]
    ContentRootNotDirectory(PathBuf),

    /// Commit window of zero
    #[error("The commit window must include at least one commit")]
    EmptyWindow,

    /// Timeout of zero seconds
    #[error("The request timeout must be at least one second")]
    ZeroTimeout,
}
