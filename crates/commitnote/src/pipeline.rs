// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Pipeline coordination
//!
//! A run walks `Inspecting → GateCheck → {Skipped | Synthesizing} → Emitting
//! → HistoryUpdate → [CommitPropagation]`. The [`RunHistory`] is handed in by
//! the caller and handed back in the [`RunReport`]; it is only mutated and
//! persisted after the note file has been written.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use commitnote::emit::Emitter;
//! use commitnote::history::HistoryStore;
//! use commitnote::pipeline::{Pipeline, RunRequest};
//! use commitnote_claude::{ClaudeSynthesizer, SynthConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let synthesizer = Arc::new(ClaudeSynthesizer::new(SynthConfig::default())?);
//! let pipeline = Pipeline::new(
//!     synthesizer,
//!     Emitter::new("src/pages/notes"),
//!     HistoryStore::new(".note-history.json"),
//! );
//! let report = pipeline.execute(&RunRequest::new("../my-project")).await?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use commitnote_claude::{Note, NoteSynthesizer, SynthError};
use commitnote_git::{ChangeWindow, Committer, GitError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::emit::{EmitError, EmittedNote, Emitter, PlannedNote};
use crate::history::{HistoryError, HistoryStore, RunHistory};
use crate::tags::{Classifier, TagSet};

/// Minimum time between two note-producing runs
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// Error Types
// ============================================================================

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Repository inspection failed
    #[error("Inspection failed: {0}")]
    Git(#[from] GitError),

    /// Note synthesis failed
    #[error("Synthesis failed: {0}")]
    Synth(#[from] SynthError),

    /// Writing the note failed
    #[error("Emission failed: {0}")]
    Emit(#[from] EmitError),

    /// Loading or saving the run history failed
    #[error("History failed: {0}")]
    History(#[from] HistoryError),
}

impl PipelineError {
    /// Whether the failure is a local configuration problem
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Synth(err) => err.is_configuration(),
            Self::Git(GitError::RepositoryNotFound { .. } | GitError::InvalidWindow { .. }) => {
                true
            }
            Self::History(_) => true,
            _ => false,
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Stages of a run, logged as they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the change window
    Inspecting,
    /// Evaluating the idempotency and cooldown checks
    GateCheck,
    /// Classifying tags and waiting on the text-generation service
    Synthesizing,
    /// Writing the note file
    Emitting,
    /// Recording and persisting the run
    HistoryUpdate,
    /// Committing the note into the content repository
    CommitPropagation,
}

/// Why a run stopped at the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The change identifier already produced a note
    AlreadyProcessed {
        /// The change identifier
        change_id: String,
    },
    /// The last successful run is more recent than the cooldown
    CoolingDown {
        /// Time since the last run (negative if it lies in the future)
        elapsed: TimeDelta,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyProcessed { change_id } => {
                write!(f, "already processed commit {change_id}")
            }
            Self::CoolingDown { elapsed } => {
                write!(f, "last run was {}s ago", elapsed.num_seconds())
            }
        }
    }
}

/// Check whether `change_id` is recorded in the history
#[must_use]
pub fn already_processed(history: &RunHistory, change_id: &str) -> bool {
    history.contains(change_id)
}

/// Time since the last run, if it is below `cooldown`
#[must_use]
pub fn within_cooldown(
    history: &RunHistory,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<TimeDelta> {
    let last_run = history.last_run?;
    let elapsed = now.signed_duration_since(last_run);
    let cooldown = TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX);
    (elapsed < cooldown).then_some(elapsed)
}

/// Evaluate both gate checks, the processed-id check first
#[must_use]
pub fn gate(
    history: &RunHistory,
    change_id: &str,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<SkipReason> {
    if already_processed(history, change_id) {
        return Some(SkipReason::AlreadyProcessed {
            change_id: change_id.to_string(),
        });
    }
    within_cooldown(history, now, cooldown).map(|elapsed| SkipReason::CoolingDown { elapsed })
}

// ============================================================================
// Requests and Reports
// ============================================================================

/// What to run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Source repository path
    pub repo: PathBuf,
    /// Number of commits in the window
    pub commits: usize,
    /// Stop before writing anything
    pub dry_run: bool,
    /// Commit the written note into the content repository
    pub auto_commit: bool,
}

impl RunRequest {
    /// A single-commit, side-effecting run against `repo`
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            commits: 1,
            dry_run: false,
            auto_commit: false,
        }
    }

    /// Set the window size
    #[must_use]
    pub fn with_commits(mut self, commits: usize) -> Self {
        self.commits = commits;
        self
    }

    /// Enable preview mode
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Enable commit propagation
    #[must_use]
    pub fn auto_commit(mut self) -> Self {
        self.auto_commit = true;
        self
    }
}

/// Result of the optional commit step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// The note was committed
    Committed {
        /// SHA of the new commit
        sha: String,
    },
    /// Committing failed; the note and history are kept
    Failed {
        /// Error description
        error: String,
    },
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Stopped at the gate
    Skipped(SkipReason),
    /// Preview mode: everything computed, nothing written
    Previewed {
        /// Inspected window
        window: ChangeWindow,
        /// Derived tags
        tags: TagSet,
        /// Synthesized note
        note: Note,
        /// File that would have been written
        plan: PlannedNote,
    },
    /// A note file was written and the run recorded
    Emitted {
        /// Inspected window
        window: ChangeWindow,
        /// Derived tags
        tags: TagSet,
        /// Synthesized note
        note: Note,
        /// The written file
        file: EmittedNote,
        /// Commit step result, if requested
        commit: Option<CommitStatus>,
    },
}

/// Outcome of a run together with the (possibly updated) history
#[derive(Debug, Clone)]
pub struct RunReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// History after the run
    pub history: RunHistory,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Wires inspection, classification, synthesis, emission and history together
pub struct Pipeline {
    synthesizer: Arc<dyn NoteSynthesizer>,
    classifier: Classifier,
    emitter: Emitter,
    store: HistoryStore,
    committer: Option<Arc<dyn Committer>>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl Pipeline {
    /// Create a pipeline with the default classifier, system clock and cooldown
    #[must_use]
    pub fn new(synthesizer: Arc<dyn NoteSynthesizer>, emitter: Emitter, store: HistoryStore) -> Self {
        Self {
            synthesizer,
            classifier: Classifier::default(),
            emitter,
            store,
            committer: None,
            clock: Arc::new(SystemClock),
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Use the given committer for `auto_commit` runs
    #[must_use]
    pub fn with_committer(mut self, committer: Arc<dyn Committer>) -> Self {
        self.committer = Some(committer);
        self
    }

    /// Use the given clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a custom rule table
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Override the cooldown
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Load the history and run
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`]; additionally fails if the history cannot be loaded.
    pub async fn execute(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let history = self.store.load()?;
        self.run(request, history).await
    }

    /// Run once against `history`
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if inspection, synthesis, emission or history
    /// persistence fails. Commit failures are reported in the outcome instead.
    pub async fn run(
        &self,
        request: &RunRequest,
        mut history: RunHistory,
    ) -> Result<RunReport, PipelineError> {
        enter(Stage::Inspecting);
        let window = commitnote_git::inspect(&request.repo, request.commits)?;
        if window.change_id.is_empty() {
            // No identifier to key the history on
            return Err(GitError::InvalidReference {
                reference: "HEAD".to_string(),
            }
            .into());
        }
        info!(
            repo = %window.repo_name,
            branch = %window.branch,
            change = %window.change_id,
            "Analyzed {}",
            window.headline()
        );

        enter(Stage::GateCheck);
        if let Some(reason) = gate(&history, &window.change_id, self.clock.now(), self.cooldown) {
            info!(%reason, "Skipping run");
            return Ok(RunReport {
                outcome: RunOutcome::Skipped(reason),
                history,
            });
        }

        enter(Stage::Synthesizing);
        let tags = self.classifier.classify(&window);
        info!(%tags, "Detected tags");
        let note = self.synthesizer.synthesize(&window).await?;
        info!(title = %note.title(), "Generated note");

        let now = self.clock.now();
        let plan = self.emitter.plan(&note, &tags, &window, now);

        if request.dry_run {
            info!(file = %plan.file_name, "Dry run, not writing file");
            return Ok(RunReport {
                outcome: RunOutcome::Previewed {
                    window,
                    tags,
                    note,
                    plan,
                },
                history,
            });
        }

        enter(Stage::Emitting);
        let file = self.emitter.write_planned(&plan, now)?;
        info!(file = %file.file_name, "Note written");

        enter(Stage::HistoryUpdate);
        history.record(&window.change_id, now);
        self.store.save(&history)?;

        let commit = request
            .auto_commit
            .then(|| self.propagate(&file, &window));

        Ok(RunReport {
            outcome: RunOutcome::Emitted {
                window,
                tags,
                note,
                file,
                commit,
            },
            history,
        })
    }

    fn propagate(&self, file: &EmittedNote, window: &ChangeWindow) -> CommitStatus {
        enter(Stage::CommitPropagation);
        let Some(committer) = &self.committer else {
            warn!("Auto-commit requested but no committer is configured");
            return CommitStatus::Failed {
                error: "no committer configured".to_string(),
            };
        };

        let message = format!("note: auto-generated from {}", window.repo_name);
        match committer.stage_and_commit(&file.path, &message) {
            Ok(sha) => {
                info!(commit = %sha, "Committed note");
                CommitStatus::Committed { sha }
            }
            Err(err) => {
                warn!(error = %err, "Commit failed, note and history are kept");
                CommitStatus::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

fn enter(stage: Stage) {
    debug!(?stage, "entering stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, s).unwrap()
    }

    fn history(ids: &[&str], last_run: Option<DateTime<Utc>>) -> RunHistory {
        RunHistory {
            last_run,
            processed_commits: ids.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_processed_check_ignores_time() {
        let h = history(&["abc1234"], Some(at(1, 0, 0)));
        assert!(already_processed(&h, "abc1234"));
        assert!(!already_processed(&h, "def5678"));
        assert_eq!(
            gate(&h, "abc1234", at(23, 0, 0), DEFAULT_COOLDOWN),
            Some(SkipReason::AlreadyProcessed {
                change_id: "abc1234".to_string()
            })
        );
    }

    #[test]
    fn test_cooldown_check_is_independent_of_id() {
        let h = history(&[], Some(at(10, 0, 0)));
        assert_eq!(
            within_cooldown(&h, at(10, 4, 59), DEFAULT_COOLDOWN),
            Some(TimeDelta::seconds(299))
        );
        assert_eq!(within_cooldown(&h, at(10, 5, 0), DEFAULT_COOLDOWN), None);
        assert!(matches!(
            gate(&h, "new1234", at(10, 1, 0), DEFAULT_COOLDOWN),
            Some(SkipReason::CoolingDown { .. })
        ));
    }

    #[test]
    fn test_no_last_run_never_cools_down() {
        let h = history(&[], None);
        assert_eq!(within_cooldown(&h, at(10, 0, 0), DEFAULT_COOLDOWN), None);
        assert_eq!(gate(&h, "abc1234", at(10, 0, 0), DEFAULT_COOLDOWN), None);
    }

    #[test]
    fn test_future_last_run_counts_as_cooling_down() {
        let h = history(&[], Some(at(12, 0, 0)));
        let elapsed = within_cooldown(&h, at(11, 0, 0), DEFAULT_COOLDOWN).expect("cooling down");
        assert!(elapsed < TimeDelta::zero());
    }

    #[test]
    fn test_processed_wins_over_cooldown() {
        let h = history(&["abc1234"], Some(at(10, 0, 0)));
        assert!(matches!(
            gate(&h, "abc1234", at(10, 1, 0), DEFAULT_COOLDOWN),
            Some(SkipReason::AlreadyProcessed { .. })
        ));
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::CoolingDown {
            elapsed: TimeDelta::seconds(42),
        };
        assert_eq!(reason.to_string(), "last run was 42s ago");
        let reason = SkipReason::AlreadyProcessed {
            change_id: "abc1234".to_string(),
        };
        assert_eq!(reason.to_string(), "already processed commit abc1234");
    }

    #[test]
    fn test_run_request_builder() {
        let request = RunRequest::new("/tmp/repo").with_commits(3).dry_run().auto_commit();
        assert_eq!(request.commits, 3);
        assert!(request.dry_run);
        assert!(request.auto_commit);
    }

    #[test]
    fn test_configuration_errors() {
        let err = PipelineError::Synth(SynthError::MissingApiKey("X".to_string()));
        assert!(err.is_configuration());
        let err = PipelineError::Synth(SynthError::Parse("bad".to_string()));
        assert!(!err.is_configuration());
        let err = PipelineError::Git(GitError::RepositoryNotFound {
            path: "/nope".to_string(),
        });
        assert!(err.is_configuration());
    }
}
