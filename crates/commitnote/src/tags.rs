//! Tag classification
//!
//! Tags are derived from an ordered table of [`TagRule`]s. Each rule names
//! the text [`Surface`] it inspects and a regular expression; the first rule
//! to match a label adds it to the [`TagSet`]. Table order is output order.

use std::fmt;
use std::sync::LazyLock;

use commitnote_git::ChangeWindow;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Maximum number of tags attached to a note
pub const MAX_TAGS: usize = 5;

/// Tag rule errors
#[derive(Debug, Error)]
pub enum TagError {
    /// A rule pattern is not a valid regular expression
    #[error("Invalid pattern for tag {label}: {source}")]
    InvalidPattern {
        /// Label of the offending rule
        label: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Text surface of a change window a rule is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Per-file change statistics (paths and counts)
    FileStats,
    /// The truncated diff body
    DiffBody,
    /// The commit message log
    CommitLog,
}

/// One `(surface, pattern) -> label` entry of the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    /// Label added when the pattern matches
    pub label: &'static str,
    /// Surface the pattern is matched against
    pub surface: Surface,
    /// Regular expression (regex crate syntax)
    pub pattern: &'static str,
}

const fn rule(label: &'static str, surface: Surface, pattern: &'static str) -> TagRule {
    TagRule {
        label,
        surface,
        pattern,
    }
}

/// Built-in rule table
pub const DEFAULT_RULES: &[TagRule] = &[
    // File extensions
    rule("TypeScript", Surface::FileStats, r"\.(?:ts|tsx)\b"),
    rule("JavaScript", Surface::FileStats, r"\.(?:js|jsx|mjs|cjs)\b"),
    rule("Python", Surface::FileStats, r"\.py\b"),
    rule("Go", Surface::FileStats, r"\.go\b"),
    rule("Rust", Surface::FileStats, r"\.rs\b"),
    rule("CSS", Surface::FileStats, r"\.(?:css|scss)\b"),
    // Framework keywords
    rule("React", Surface::DiffBody, r"(?i)react|useState|useEffect"),
    rule("Electron", Surface::DiffBody, r"(?i)electron|ipcMain|ipcRenderer"),
    rule("API", Surface::DiffBody, r"(?i)express|fastapi|flask"),
    rule("Database", Surface::DiffBody, r"(?i)sqlite|postgres|mysql"),
    rule("Docker", Surface::FileStats, r"(?i)docker"),
    // Generic
    rule("Testing", Surface::FileStats, r"(?i)test|spec"),
    rule("Debug", Surface::CommitLog, r"(?i)bug|fix"),
];

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(DEFAULT_RULES).expect("built-in tag rules are valid regular expressions")
});

/// Ordered set of at most [`MAX_TAGS`] distinct labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Create an empty tag set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label; returns `false` if it is already present or the set is full
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.is_full() || self.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    /// Check whether `label` is present
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|existing| existing == label)
    }

    /// Check whether no more labels can be added
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_TAGS
    }

    /// Number of labels
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate labels in detection order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    label: &'static str,
    surface: Surface,
    regex: Regex,
}

/// Compiled rule table
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

impl Classifier {
    /// Compile a rule table
    ///
    /// # Errors
    ///
    /// Returns `TagError::InvalidPattern` for the first rule that does not compile.
    pub fn new(rules: &[TagRule]) -> Result<Self, TagError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern)
                    .map(|regex| CompiledRule {
                        label: rule.label,
                        surface: rule.surface,
                        regex,
                    })
                    .map_err(|source| TagError::InvalidPattern {
                        label: rule.label.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Derive the tag set of a change window
    #[must_use]
    pub fn classify(&self, window: &ChangeWindow) -> TagSet {
        let stats = window.stat_text();
        let mut tags = TagSet::new();

        for rule in &self.rules {
            if tags.is_full() {
                break;
            }
            if tags.contains(rule.label) {
                continue;
            }
            let text = match rule.surface {
                Surface::FileStats => stats.as_str(),
                Surface::DiffBody => window.diff.as_str(),
                Surface::CommitLog => window.log.as_str(),
            };
            if rule.regex.is_match(text) {
                tags.insert(rule.label);
            }
        }

        tags
    }
}

/// Classify with the built-in rule table
#[must_use]
pub fn classify(window: &ChangeWindow) -> TagSet {
    DEFAULT_CLASSIFIER.classify(window)
}
