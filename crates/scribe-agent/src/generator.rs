//! Generation contract shared by the real client and test doubles

use async_trait::async_trait;
use scribe_core::{ProgressSink, Result};
use serde::{Deserialize, Serialize};

use crate::tools::Toolbox;
use crate::types::RoleConfig;

/// Speaker of a prior conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One prior turn supplied as conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything one role invocation needs
pub struct GenerationRequest<'a> {
    pub role: &'a RoleConfig,
    /// System directive for the role
    pub directive: &'a str,
    /// The new user turn
    pub input: String,
    pub history: Vec<ChatMessage>,
    pub tools: &'a dyn Toolbox,
    pub progress: &'a ProgressSink,
}

/// Produces role output, calling tools as often as the role needs
///
/// Failures are either transient (see [`scribe_core::ScribeError::is_transient`])
/// or unexpected. Callers decide how to absorb them.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String>;
}
