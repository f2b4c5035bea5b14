//! commitnote: turn recent commits into timestamped technical notes
//!
//! stdout carries only the preview markdown or the written file name; all
//! logging goes to stderr.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use commitnote::config::Config;
use commitnote::emit::Emitter;
use commitnote::history::HistoryStore;
use commitnote::pipeline::{CommitStatus, Pipeline, RunOutcome};
use commitnote_claude::ClaudeSynthesizer;
use commitnote_git::GitCommitter;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    let synthesizer = ClaudeSynthesizer::new(config.synth_config())
        .context("failed to build the Messages API client")?;
    let content_root = config.content_root();
    let pipeline = Pipeline::new(
        Arc::new(synthesizer),
        Emitter::new(config.notes_dir()),
        HistoryStore::new(config.history_path()),
    )
    .with_committer(Arc::new(GitCommitter::new(&content_root)));

    info!(repo = %config.repo.display(), commits = config.commits, "Starting commitnote");
    let report = pipeline
        .execute(&config.run_request())
        .await
        .context("note generation failed")?;

    match report.outcome {
        RunOutcome::Skipped(reason) => {
            info!(%reason, "Nothing to do");
        }
        RunOutcome::Previewed { plan, .. } => {
            info!(file = %plan.file_name, "Preview");
            print!("{}", plan.markdown);
        }
        RunOutcome::Emitted { file, commit, .. } => {
            println!("{}", file.file_name);
            if let Some(CommitStatus::Committed { sha }) = commit {
                info!(commit = %sha, "Note committed");
            }
        }
    }

    Ok(())
}
