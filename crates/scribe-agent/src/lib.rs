//! # scribe-agent
//!
//! Generation and tool plumbing for Scribe roles.
//!
//! - [`Generator`]: the contract a role invocation goes through, so the
//!   orchestrator can run against the real API or a scripted double
//! - [`AnthropicClient`]: Messages API client with a tool-use loop, retry with
//!   backoff and a per-client circuit breaker
//! - [`ToolSandbox`]: file access rooted at the project directory plus memory
//!   operations
//! - [`RoleTools`]: the subset of sandbox tools one role may call

mod auth;
mod circuit_breaker;
mod client;
mod generator;
pub mod sandbox;
pub mod tools;
mod types;

pub use auth::get_auth_token;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use client::AnthropicClient;
pub use generator::{ChatMessage, ChatRole, GenerationRequest, Generator};
pub use sandbox::{validate_path, ToolSandbox};
pub use tools::{NoTools, RoleTools, ToolDefinition, ToolKind, ToolOutput, Toolbox};
pub use types::*;
