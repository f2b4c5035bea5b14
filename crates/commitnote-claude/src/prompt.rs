//! Prompt construction

use crate::note::{CONTENT_MARKER, TITLE_MARKER};
use commitnote_git::ChangeWindow;

/// Build the single user prompt for a change window
///
/// The prompt embeds the repository name, branch, commit log, diff
/// statistics and the truncated diff, and pins the reply to the
/// `TITLE:` / `CONTENT:` layout understood by [`parse_note`](crate::parse_note).
#[must_use]
pub fn build_prompt(window: &ChangeWindow, language: &str) -> String {
    format!(
        "You are a technical note generator. Based on the git diff and commit messages below, \
write one concise technical note in {language}.

Project: {repo}
Branch: {branch}
Commits:
{log}

Change statistics:
{stat}

Partial diff:
{diff}

Produce:
1. A title (one sentence naming the technical focus of this change)
2. Content (2-3 paragraphs: what was done, why, and which technical details are worth recording)

Requirements:
- Make the title specific, not generic
- Keep the content technical and record key implementation details or pitfalls
- Stay concise, under 500 words
- Use markdown

Reply exactly in this layout:
{TITLE_MARKER} <title>
{CONTENT_MARKER}
<content>",
        repo = window.repo_name,
        branch = window.branch,
        log = window.log,
        stat = window.stat_text(),
        diff = window.diff,
    )
}
