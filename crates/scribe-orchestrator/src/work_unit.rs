//! File work unit - drives one file through the writer/reviewer loop
//!
//! The unit owns the I/O: it reads the source, invokes the roles and emits
//! progress. Every decision is delegated to [`crate::state_machine`].

use crate::prompt;
use crate::state_machine::{transition, Action, WorkEvent, WorkPhase, WorkState};
use scribe_agent::{ChatMessage, GenerationRequest, Generator, RoleConfig, RoleTools, ToolSandbox};
use scribe_core::{FileOutcome, FileTarget, Fragment, ProgressSink};
use tracing::{debug, info};

/// Writer/reviewer loop for a single file
pub struct FileWorkUnit<'a> {
    generator: &'a dyn Generator,
    sandbox: &'a ToolSandbox,
    progress: &'a ProgressSink,
    writer: &'a RoleConfig,
    reviewer: &'a RoleConfig,
    max_revisions: usize,
}

impl<'a> FileWorkUnit<'a> {
    pub fn new(
        generator: &'a dyn Generator,
        sandbox: &'a ToolSandbox,
        progress: &'a ProgressSink,
        writer: &'a RoleConfig,
        reviewer: &'a RoleConfig,
    ) -> Self {
        Self {
            generator,
            sandbox,
            progress,
            writer,
            reviewer,
            max_revisions: 3,
        }
    }

    pub fn with_max_revisions(mut self, max_revisions: usize) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    /// Run the loop to completion
    ///
    /// Never fails: role failures are folded into the draft or the verdict.
    pub async fn run(&self, file: &FileTarget) -> (Fragment, FileOutcome) {
        info!("Starting work unit for {}", file);

        let mut state = WorkState::new(file.clone());

        while !state.is_done() {
            let event = match state.phase {
                WorkPhase::Write => self.write(&state).await,
                WorkPhase::Review => self.review(&state).await,
                WorkPhase::End => break,
            };

            let (next, actions) = transition(state, event, self.max_revisions);
            self.perform(actions);
            state = next;
        }

        debug!(
            "Work unit for {} finished after {} revision(s)",
            file, state.revision_count
        );

        let outcome = state.outcome();
        let fragment = Fragment {
            file: state.file,
            text: state.draft,
        };
        (fragment, outcome)
    }

    async fn write(&self, state: &WorkState) -> WorkEvent {
        let source = match self.sandbox.read(state.file.as_str()) {
            Ok(source) => source,
            Err(e) => {
                return WorkEvent::WriterFailed {
                    message: format!("could not read {}: {}", state.file, e),
                    transient: false,
                }
            }
        };

        let revision = state.revision_count + 1;
        self.progress.agent(format!(
            "Writer documenting {} (revision {}/{})",
            state.file, revision, self.max_revisions
        ));

        // Later passes revise the previous draft in conversation
        let (input, history) = if state.revision_count == 0 {
            (prompt::writer_input(&state.file, &source), Vec::new())
        } else {
            (
                prompt::revision_input(&state.file, &state.feedback),
                vec![
                    ChatMessage::user(prompt::writer_input(&state.file, &source)),
                    ChatMessage::assistant(state.draft.clone()),
                ],
            )
        };

        let tools = RoleTools::writer(self.sandbox, self.progress);
        let request = GenerationRequest {
            role: self.writer,
            directive: prompt::WRITER_DIRECTIVE,
            input,
            history,
            tools: &tools,
            progress: self.progress,
        };

        match self.generator.generate(request).await {
            Ok(text) => WorkEvent::Drafted { text },
            Err(e) => WorkEvent::WriterFailed {
                message: e.to_string(),
                transient: e.is_transient(),
            },
        }
    }

    async fn review(&self, state: &WorkState) -> WorkEvent {
        self.progress.agent(format!(
            "Reviewer checking draft {} for {}",
            state.revision_count, state.file
        ));

        let tools = RoleTools::reviewer(self.sandbox, self.progress);
        let request = GenerationRequest {
            role: self.reviewer,
            directive: prompt::REVIEWER_DIRECTIVE,
            input: prompt::reviewer_input(&state.file, &state.draft),
            history: Vec::new(),
            tools: &tools,
            progress: self.progress,
        };

        match self.generator.generate(request).await {
            Ok(feedback) => WorkEvent::Reviewed { feedback },
            Err(e) => WorkEvent::ReviewerFailed {
                message: e.to_string(),
                transient: e.is_transient(),
            },
        }
    }

    fn perform(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Log { level, message } => self.progress.emit(level, message),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scribe_agent::{Model, Role};
    use scribe_core::{LogLevel, Result, ScribeError};
    use scribe_memory::MemoryStore;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records every request and answers from a per-role script
    #[derive(Default)]
    struct Scripted {
        writer: Mutex<Vec<Result<String>>>,
        reviewer: Mutex<Vec<Result<String>>>,
        seen: Mutex<Vec<(Role, String, usize)>>,
    }

    impl Scripted {
        fn new(writer: Vec<Result<String>>, reviewer: Vec<Result<String>>) -> Self {
            Self {
                writer: Mutex::new(writer),
                reviewer: Mutex::new(reviewer),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self, role: Role) -> usize {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|(r, _, _)| *r == role)
                .count()
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
            self.seen.lock().unwrap().push((
                request.role.role,
                request.input.clone(),
                request.history.len(),
            ));
            let script = match request.role.role {
                Role::Writer => &self.writer,
                _ => &self.reviewer,
            };
            let mut script = script.lock().unwrap();
            if script.is_empty() {
                Ok("APPROVED".to_string())
            } else {
                script.remove(0)
            }
        }
    }

    struct Fixture {
        _dir: TempDir,
        sandbox: ToolSandbox,
        progress: ProgressSink,
        writer: RoleConfig,
        reviewer: RoleConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("A.java"), "class A {}").unwrap();
        let sandbox = ToolSandbox::new(dir.path(), Arc::new(MemoryStore::default())).unwrap();
        Fixture {
            _dir: dir,
            sandbox,
            progress: ProgressSink::new(),
            writer: RoleConfig::new(Role::Writer, Model::Sonnet),
            reviewer: RoleConfig::new(Role::Reviewer, Model::Sonnet),
        }
    }

    fn unit<'a>(fx: &'a Fixture, generator: &'a Scripted) -> FileWorkUnit<'a> {
        FileWorkUnit::new(generator, &fx.sandbox, &fx.progress, &fx.writer, &fx.reviewer)
    }

    #[tokio::test]
    async fn test_approved_on_first_review() {
        let fx = fixture();
        let generator = Scripted::new(vec![Ok("# A docs".into())], vec![Ok("APPROVED".into())]);

        let (fragment, outcome) = unit(&fx, &generator).run(&"A.java".into()).await;

        assert_eq!(fragment.text, "# A docs");
        assert_eq!(outcome.revisions, 1);
        assert!(outcome.approved);
        assert_eq!(generator.calls(Role::Writer), 1);
        assert_eq!(generator.calls(Role::Reviewer), 1);
    }

    #[tokio::test]
    async fn test_revision_gets_feedback_and_history() {
        let fx = fixture();
        let generator = Scripted::new(
            vec![Ok("draft one".into()), Ok("draft two".into())],
            vec![Ok("1. Document the constructor.".into()), Ok("approved".into())],
        );

        let (fragment, outcome) = unit(&fx, &generator).run(&"A.java".into()).await;
        assert_eq!(fragment.text, "draft two");
        assert_eq!(outcome.revisions, 2);

        let seen = generator.seen.lock().unwrap();
        let second_writer = seen.iter().filter(|(r, _, _)| *r == Role::Writer).nth(1).unwrap();
        assert!(second_writer.1.contains("Document the constructor."));
        assert_eq!(second_writer.2, 2);
    }

    #[tokio::test]
    async fn test_never_approving_reviewer_hits_cap() {
        let fx = fixture();
        let generator = Scripted::new(
            vec![Ok("d1".into()), Ok("d2".into()), Ok("d3".into())],
            vec![Ok("no".into()), Ok("no".into()), Ok("still no".into())],
        );

        let (fragment, outcome) = unit(&fx, &generator).run(&"A.java".into()).await;
        assert_eq!(fragment.text, "d3");
        assert_eq!(outcome.revisions, 3);
        assert!(!outcome.approved);
        assert_eq!(generator.calls(Role::Writer), 3);
        assert_eq!(generator.calls(Role::Reviewer), 3);
    }

    #[tokio::test]
    async fn test_writer_failure_is_reviewed() {
        let fx = fixture();
        let mut rx = fx.progress.subscribe();
        let generator = Scripted::new(
            vec![Err(ScribeError::Transient("503".into()))],
            vec![Ok("APPROVED".into())],
        );

        let (fragment, outcome) = unit(&fx, &generator).run(&"A.java".into()).await;
        assert!(fragment.text.starts_with("[DOCUMENTATION ERROR]"));
        assert_eq!(outcome.writer_failures, 1);
        assert_eq!(generator.calls(Role::Reviewer), 1);

        let mut saw_error = false;
        while let Ok(event) = rx.try_recv() {
            saw_error |= event.level == LogLevel::Error;
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_missing_source_counts_as_writer_failure() {
        let fx = fixture();
        let generator = Scripted::new(vec![], vec![Ok("APPROVED".into())]);

        let (fragment, outcome) = unit(&fx, &generator).run(&"Gone.java".into()).await;
        assert!(fragment.text.starts_with("[DOCUMENTATION ERROR]"));
        assert_eq!(outcome.revisions, 1);
        assert_eq!(generator.calls(Role::Writer), 0);
    }

    #[tokio::test]
    async fn test_reviewer_failure_approves() {
        let fx = fixture();
        let generator = Scripted::new(
            vec![Ok("draft".into())],
            vec![Err(ScribeError::Api("400".into()))],
        );

        let (fragment, outcome) = unit(&fx, &generator).run(&"A.java".into()).await;
        assert_eq!(fragment.text, "draft");
        assert!(outcome.approved);
        assert_eq!(outcome.reviewer_failures, 1);
        assert_eq!(generator.calls(Role::Writer), 1);
    }

    #[tokio::test]
    async fn test_custom_cap() {
        let fx = fixture();
        let generator = Scripted::new(
            vec![Ok("d1".into()), Ok("d2".into())],
            vec![Ok("no".into()), Ok("no".into())],
        );

        let (_, outcome) = unit(&fx, &generator)
            .with_max_revisions(1)
            .run(&"A.java".into())
            .await;
        assert_eq!(outcome.revisions, 1);
        assert_eq!(generator.calls(Role::Writer), 1);
    }
}
