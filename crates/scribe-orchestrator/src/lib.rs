//! # scribe-orchestrator
//!
//! Documentation run engine for Scribe.
//!
//! This crate provides:
//! - The per-file writer/reviewer state machine (pure, no I/O)
//! - The file work unit that drives a file through that machine
//! - The orchestrator that walks a project and publishes the result
//! - Role directives and prompts
//! - An optional Markdown activity log

mod activity_logger;
mod orchestrator;
pub mod prompt;
mod publisher;
mod state_machine;
mod work_unit;

pub use activity_logger::ActivityLogger;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use publisher::{join_fragments, publish, FALLBACK_TITLE, FRAGMENT_SEPARATOR};
pub use state_machine::{
    is_approved, transition, Action, WorkEvent, WorkPhase, WorkState, APPROVAL_TOKEN,
    DRAFT_ERROR_MARKER,
};
pub use work_unit::FileWorkUnit;
