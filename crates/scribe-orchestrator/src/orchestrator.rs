//! Core orchestrator implementation
//!
//! One run: list the project's files, document each one in discovery order,
//! then publish the fragments. The only run-fatal failure is not being able to
//! list files; everything that goes wrong inside a file is absorbed by its
//! work unit.

use crate::activity_logger::ActivityLogger;
use crate::publisher;
use crate::work_unit::FileWorkUnit;
use scribe_agent::{Generator, Role, RoleConfig, ToolSandbox};
use scribe_core::{Fragment, ProgressSink, Result, RunOutcome, RunReport, ScribeConfig};
use scribe_memory::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for an orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Extension of the files to document (without the dot)
    pub extension: String,
    /// Writer invocations allowed per file
    pub max_revisions: usize,
    /// Pause between consecutive files
    pub inter_file_delay: Duration,
    /// Chunks returned by the `recall` tool
    pub recall_k: usize,
    /// Names the writer may never overwrite
    pub protected_files: Vec<String>,
    pub writer: RoleConfig,
    pub reviewer: RoleConfig,
    pub publisher: RoleConfig,
}

impl OrchestratorConfig {
    /// Build from repository configuration
    pub fn from_config(config: &ScribeConfig) -> Result<Self> {
        Ok(Self {
            extension: config.run.extension.trim_start_matches('.').to_string(),
            max_revisions: config.run.max_revisions,
            inter_file_delay: config.run.inter_file_delay(),
            recall_k: config.memory.search_k,
            protected_files: config.run.protected_files.clone(),
            writer: RoleConfig::from_settings(Role::Writer, &config.models)?,
            reviewer: RoleConfig::from_settings(Role::Reviewer, &config.models)?,
            publisher: RoleConfig::from_settings(Role::Publisher, &config.models)?,
        })
    }

    pub fn with_max_revisions(mut self, max_revisions: usize) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    pub fn with_inter_file_delay(mut self, delay: Duration) -> Self {
        self.inter_file_delay = delay;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let defaults = ScribeConfig::default();
        Self {
            extension: defaults.run.extension.clone(),
            max_revisions: defaults.run.max_revisions,
            inter_file_delay: defaults.run.inter_file_delay(),
            recall_k: defaults.memory.search_k,
            protected_files: defaults.run.protected_files.clone(),
            writer: RoleConfig::new(Role::Writer, Default::default()),
            reviewer: RoleConfig::new(Role::Reviewer, Default::default()),
            publisher: RoleConfig::new(Role::Publisher, Default::default()),
        }
    }
}

/// Runs documentation missions against one generator and memory store
pub struct Orchestrator {
    config: OrchestratorConfig,
    generator: Arc<dyn Generator>,
    memory: Arc<MemoryStore>,
    progress: ProgressSink,
    activity_logger: Option<ActivityLogger>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        generator: Arc<dyn Generator>,
        memory: Arc<MemoryStore>,
        progress: ProgressSink,
    ) -> Self {
        Self {
            config,
            generator,
            memory,
            progress,
            activity_logger: None,
        }
    }

    /// Enable activity logging to `<dir>/activity.md`
    pub fn with_activity_logging(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.activity_logger = Some(ActivityLogger::new(dir));
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.progress
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Document every matching file under `project_root`
    pub async fn run(&self, project_root: &Path) -> RunOutcome {
        self.run_with_revisions(project_root, self.config.max_revisions)
            .await
    }

    /// Like [`Orchestrator::run`] with a per-run revision cap
    pub async fn run_with_revisions(&self, project_root: &Path, max_revisions: usize) -> RunOutcome {
        let max_revisions = max_revisions.max(1);
        self.progress.info(format!(
            "Starting documentation mission for {}",
            project_root.display()
        ));

        let sandbox = match ToolSandbox::new(project_root, Arc::clone(&self.memory)) {
            Ok(sandbox) => sandbox
                .with_protected_files(self.config.protected_files.clone())
                .with_extension(self.config.extension.clone())
                .with_recall_k(self.config.recall_k),
            Err(e) => return self.fail(e.to_string()),
        };

        let files = match sandbox.list(&self.config.extension) {
            Ok(files) => files,
            Err(e) => return self.fail(e.to_string()),
        };

        if files.is_empty() {
            let summary = format!(
                "No files matching '.{}' were found in {}",
                self.config.extension,
                project_root.display()
            );
            self.progress.info(summary.clone());
            return RunOutcome {
                document: String::new(),
                report: RunReport::empty(summary),
            };
        }

        let total = files.len();
        self.progress.info(format!(
            "Found {} file(s) to document (max {} revision(s) each)",
            total, max_revisions
        ));
        if let Some(logger) = &self.activity_logger {
            logger.log_run_start(project_root, total, max_revisions).await;
        }

        let unit = FileWorkUnit::new(
            self.generator.as_ref(),
            &sandbox,
            &self.progress,
            &self.config.writer,
            &self.config.reviewer,
        )
        .with_max_revisions(max_revisions);

        let mut fragments: Vec<Fragment> = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);

        for (index, file) in files.iter().enumerate() {
            self.progress
                .info(format!("Processing file {}/{}: {}", index + 1, total, file));

            let (fragment, outcome) = unit.run(file).await;
            if let Some(logger) = &self.activity_logger {
                logger
                    .log_file_complete(index + 1, total, &outcome, &fragment.text)
                    .await;
            }
            fragments.push(fragment);
            outcomes.push(outcome);

            if index + 1 < total && !self.config.inter_file_delay.is_zero() {
                self.progress.info(format!(
                    "Waiting {}s before the next file",
                    self.config.inter_file_delay.as_secs_f64()
                ));
                tokio::time::sleep(self.config.inter_file_delay).await;
            }
        }

        let (document, published) = publisher::publish(
            self.generator.as_ref(),
            &self.config.publisher,
            &fragments,
            &self.progress,
        )
        .await;

        let report = RunReport::complete(outcomes, published);
        info!("Run complete: {}", report.summary);
        self.progress.info(format!("Mission complete. {}", report.summary));
        if let Some(logger) = &self.activity_logger {
            logger.log_run_complete(&report).await;
        }

        RunOutcome { document, report }
    }

    fn fail(&self, reason: String) -> RunOutcome {
        warn!("Run failed: {}", reason);
        self.progress.error(format!("Mission failed: {}", reason));
        RunOutcome {
            document: String::new(),
            report: RunReport::failed(reason),
        }
    }
}
