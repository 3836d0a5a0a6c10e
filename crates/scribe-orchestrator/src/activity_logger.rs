//! Activity Logger - human-readable run log in `activity.md`
//!
//! Records run start, each file's outcome with a preview of its fragment, and
//! the final summary. Every write is fail-open.

use chrono::Utc;
use scribe_core::fail_open::fail_open;
use scribe_core::{FileOutcome, RunReport};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Maximum characters of a fragment shown in the log
const ACTIVITY_LOG_PREVIEW_CHARS: usize = 500;

/// Appends run activity to `<dir>/activity.md`
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    output_path: PathBuf,
}

impl ActivityLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_path: dir.into().join("activity.md"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Start a fresh log for a run (truncates any previous log)
    pub async fn log_run_start(&self, project: &Path, file_count: usize, max_revisions: usize) {
        fail_open("activity_logger::log_run_start", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

            let content = format!(
                "# Scribe Activity Log\n\n## Project: {}\n**Started**: {}\n**Files**: {}\n**Max Revisions**: {}\n\n---\n\n",
                project.display(),
                timestamp,
                file_count,
                max_revisions
            );

            if let Some(parent) = self.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.output_path)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;

            Ok(())
        })
        .await;
    }

    /// Record one file's outcome
    pub async fn log_file_complete(&self, index: usize, total: usize, outcome: &FileOutcome, text: &str) {
        fail_open("activity_logger::log_file_complete", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
            let verdict = if outcome.approved {
                "✓ Approved"
            } else {
                "✗ Revision cap reached"
            };

            let mut content = format!(
                "### File {}/{}: {}\n**Time**: {}\n**Revisions**: {}\n**Verdict**: {}\n",
                index, total, outcome.file, timestamp, outcome.revisions, verdict
            );

            if outcome.writer_failures > 0 || outcome.reviewer_failures > 0 {
                content.push_str(&format!(
                    "**Failures**: writer={}, reviewer={}\n",
                    outcome.writer_failures, outcome.reviewer_failures
                ));
            }
            content.push('\n');

            let preview = if text.chars().count() > ACTIVITY_LOG_PREVIEW_CHARS {
                let truncated: String = text.chars().take(ACTIVITY_LOG_PREVIEW_CHARS).collect();
                format!("{truncated}...")
            } else {
                text.to_string()
            };

            content.push_str("**Draft** (truncated):\n");
            content.push_str("> ");
            content.push_str(&preview.replace('\n', "\n> "));
            content.push_str("\n\n---\n\n");

            self.append_internal(&content).await
        })
        .await;
    }

    /// Record the run summary
    pub async fn log_run_complete(&self, report: &RunReport) {
        fail_open("activity_logger::log_run_complete", || async {
            let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

            let content = format!(
                "## Run Summary\n\n\
                **Completed**: {}\n\
                **Status**: {}\n\
                **Files**: {} processed, {} approved\n\
                **Published**: {}\n\
                **Summary**: {}\n\n",
                timestamp,
                report.status,
                report.files_processed,
                report.files_approved,
                if report.published { "yes" } else { "no (raw fragments)" },
                report.summary
            );

            self.append_internal(&content).await
        })
        .await;
    }

    async fn append_internal(&self, content: &str) -> scribe_core::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
