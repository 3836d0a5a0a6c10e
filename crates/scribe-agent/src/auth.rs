//! Authentication for the Anthropic API

use scribe_core::{Result, ScribeError};
use std::env;

/// Read the API key from the configured environment variable
pub fn get_auth_token(api_key_env: &str) -> Result<String> {
    match env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => {
            tracing::debug!("Using API key from {}", api_key_env);
            Ok(key)
        }
        _ => Err(ScribeError::Auth(format!(
            "No authentication found. Set {}=sk-ant-api03-...",
            api_key_env
        ))),
    }
}
