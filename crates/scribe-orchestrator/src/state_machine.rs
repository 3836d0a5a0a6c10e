//! Pure state machine for the per-file writer/reviewer loop
//!
//! This module has NO I/O. The work unit performs role invocations, turns
//! their results into [`WorkEvent`]s and feeds them through [`transition`],
//! then carries out the returned actions.
//!
//! - Pure function: transition(state, event, cap) -> (state, actions)
//! - Events that do not belong to the current phase leave the state
//!   unchanged (never panic)
//! - Writer and reviewer failures are absorbed here: the writer's becomes an
//!   error-marked draft, the reviewer's becomes an approval

use scribe_core::{FileOutcome, FileTarget, LogLevel};

/// Prefix of a draft produced by a failed writer invocation
pub const DRAFT_ERROR_MARKER: &str = "[DOCUMENTATION ERROR]";

/// Reviewer verdict that ends the loop
pub const APPROVAL_TOKEN: &str = "APPROVED";

/// Phase of a file's writer/reviewer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkPhase {
    /// Writer produces (or revises) the draft
    Write,
    /// Reviewer judges the current draft
    Review,
    /// Terminal - the draft is final
    End,
}

/// Per-file loop state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkState {
    pub file: FileTarget,
    pub phase: WorkPhase,
    pub draft: String,
    /// Latest reviewer output, empty before the first review
    pub feedback: String,
    /// Writer invocations so far
    pub revision_count: usize,
    pub approved: bool,
    pub writer_failures: usize,
    pub reviewer_failures: usize,
}

impl WorkState {
    pub fn new(file: FileTarget) -> Self {
        Self {
            file,
            phase: WorkPhase::Write,
            draft: String::new(),
            feedback: String::new(),
            revision_count: 0,
            approved: false,
            writer_failures: 0,
            reviewer_failures: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == WorkPhase::End
    }

    pub fn outcome(&self) -> FileOutcome {
        FileOutcome {
            file: self.file.clone(),
            revisions: self.revision_count,
            approved: self.approved,
            writer_failures: self.writer_failures,
            reviewer_failures: self.reviewer_failures,
        }
    }
}

/// Results of role invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkEvent {
    /// Writer returned a draft
    Drafted { text: String },
    /// Writer invocation (or reading its source) failed
    WriterFailed { message: String, transient: bool },
    /// Reviewer returned feedback
    Reviewed { feedback: String },
    /// Reviewer invocation failed
    ReviewerFailed { message: String, transient: bool },
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Emit a progress event
    Log { level: LogLevel, message: String },
}

impl Action {
    fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Action::Log {
            level,
            message: message.into(),
        }
    }
}

/// Whether reviewer output counts as approval
///
/// Case-insensitive substring match, so "Not approved" also approves.
pub fn is_approved(feedback: &str) -> bool {
    feedback.to_uppercase().contains(APPROVAL_TOKEN)
}

/// Pure state transition function
///
/// `cap` is the maximum number of writer invocations for the file.
pub fn transition(state: WorkState, event: WorkEvent, cap: usize) -> (WorkState, Vec<Action>) {
    match (state.phase, event) {
        (WorkPhase::Write, WorkEvent::Drafted { text }) => {
            let revision_count = state.revision_count + 1;
            let actions = vec![Action::log(
                LogLevel::Agent,
                format!(
                    "Writer produced draft {} for {} ({} chars)",
                    revision_count,
                    state.file,
                    text.len()
                ),
            )];
            (
                WorkState {
                    phase: WorkPhase::Review,
                    draft: text,
                    revision_count,
                    ..state
                },
                actions,
            )
        }

        (WorkPhase::Write, WorkEvent::WriterFailed { message, transient }) => {
            let kind = if transient { "transient" } else { "unexpected" };
            let actions = vec![Action::log(
                LogLevel::Error,
                format!("Writer failed on {} ({}): {}", state.file, kind, message),
            )];
            (
                WorkState {
                    phase: WorkPhase::Review,
                    draft: format!("{} {}", DRAFT_ERROR_MARKER, message),
                    revision_count: state.revision_count + 1,
                    writer_failures: state.writer_failures + 1,
                    ..state
                },
                actions,
            )
        }

        (WorkPhase::Review, WorkEvent::Reviewed { feedback }) => {
            let mut actions = vec![Action::log(
                LogLevel::Agent,
                format!("Reviewer feedback for {}: {}", state.file, first_line(&feedback)),
            )];
            let state = WorkState { feedback, ..state };
            let next = decide(state, cap, &mut actions);
            (next, actions)
        }

        (WorkPhase::Review, WorkEvent::ReviewerFailed { message, transient }) => {
            let kind = if transient { "transient" } else { "unexpected" };
            let mut actions = vec![Action::log(
                LogLevel::Error,
                format!(
                    "Reviewer failed on {} ({}): {}. Approving current draft.",
                    state.file, kind, message
                ),
            )];
            let state = WorkState {
                feedback: APPROVAL_TOKEN.to_string(),
                reviewer_failures: state.reviewer_failures + 1,
                ..state
            };
            let next = decide(state, cap, &mut actions);
            (next, actions)
        }

        (phase, event) => {
            let actions = vec![Action::log(
                LogLevel::Error,
                format!(
                    "Ignoring {} for {} in phase {:?}",
                    event_name(&event),
                    state.file,
                    phase
                ),
            )];
            (state, actions)
        }
    }
}

/// Post-review decision: approval or cap ends the loop, otherwise revise
fn decide(state: WorkState, cap: usize, actions: &mut Vec<Action>) -> WorkState {
    if is_approved(&state.feedback) {
        actions.push(Action::log(
            LogLevel::Info,
            format!(
                "{} approved after {} revision(s)",
                state.file, state.revision_count
            ),
        ));
        return WorkState {
            phase: WorkPhase::End,
            approved: true,
            ..state
        };
    }

    if state.revision_count >= cap {
        actions.push(Action::log(
            LogLevel::Info,
            format!(
                "{} reached the revision cap ({}); keeping the last draft",
                state.file, cap
            ),
        ));
        return WorkState {
            phase: WorkPhase::End,
            ..state
        };
    }

    actions.push(Action::log(
        LogLevel::Info,
        format!(
            "{} needs revision ({}/{})",
            state.file, state.revision_count, cap
        ),
    ));
    WorkState {
        phase: WorkPhase::Write,
        ..state
    }
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

fn event_name(event: &WorkEvent) -> &'static str {
    match event {
        WorkEvent::Drafted { .. } => "Drafted",
        WorkEvent::WriterFailed { .. } => "WriterFailed",
        WorkEvent::Reviewed { .. } => "Reviewed",
        WorkEvent::ReviewerFailed { .. } => "ReviewerFailed",
    }
}
