//! Core type definitions for a documentation run

use serde::{Deserialize, Serialize};

/// One unit of documentation work: a source file, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTarget(String);

impl FileTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileTarget {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A finished draft (approved or exhausted), labeled with its origin file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub file: FileTarget,
    pub text: String,
}

impl Fragment {
    /// Render the fragment with a header naming its file
    pub fn render(&self) -> String {
        format!("## File: {}\n\n{}", self.file, self.text.trim())
    }
}

/// Outcome of documenting a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: FileTarget,
    /// Writer invocations performed (1..=revision cap)
    pub revisions: usize,
    /// Whether the loop ended on reviewer approval rather than the cap
    pub approved: bool,
    pub writer_failures: usize,
    pub reviewer_failures: usize,
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Report produced once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub summary: String,
    pub files_processed: usize,
    pub files_approved: usize,
    /// Whether the publisher call succeeded (false when it fell back to raw fragments)
    pub published: bool,
    #[serde(default)]
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    /// A completed run that had nothing to do
    pub fn empty(summary: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Complete,
            summary: summary.into(),
            files_processed: 0,
            files_approved: 0,
            published: false,
            files: Vec::new(),
        }
    }

    /// A run that could not start processing files
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            summary: reason.into(),
            files_processed: 0,
            files_approved: 0,
            published: false,
            files: Vec::new(),
        }
    }

    /// A run that processed every discovered file
    pub fn complete(files: Vec<FileOutcome>, published: bool) -> Self {
        let files_processed = files.len();
        let files_approved = files.iter().filter(|f| f.approved).count();
        let mut summary = format!(
            "Documented {} file(s): {} approved, {} reached the revision cap",
            files_processed,
            files_approved,
            files_processed - files_approved
        );
        if !published {
            summary.push_str("; publisher unavailable, raw fragments emitted");
        }

        Self {
            status: RunStatus::Complete,
            summary,
            files_processed,
            files_approved,
            published,
            files,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}

/// Everything a run hands back to its caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    #[serde(rename = "documentation")]
    pub document: String,
    pub report: RunReport,
}
