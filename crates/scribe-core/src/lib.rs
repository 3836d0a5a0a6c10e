//! # scribe-core
//!
//! Core types for the Scribe documentation generator.
//!
//! Scribe documents a code project one file at a time. For every file a writer
//! role drafts documentation and a reviewer role either approves it or sends
//! feedback, for a bounded number of revisions. Approved drafts are assembled
//! into a single document by a publisher role.
//!
//! This crate holds what every other crate shares:
//! - The unified error type
//! - Repository-level configuration (`.scribe/config.toml`)
//! - Run data types (targets, fragments, reports)
//! - The progress channel that streams log events to listeners
//! - Fail-open helpers for infrastructure operations

pub mod config;
mod error;
pub mod fail_open;
mod progress;
mod types;

pub use config::{MemorySettings, ModelSettings, RunSettings, ScribeConfig, ServerSettings};
pub use error::{Result, ScribeError};
pub use progress::{LogEvent, LogLevel, ProgressSink};
pub use types::*;
