//! Publisher - assembles fragments into the final document

use crate::prompt;
use scribe_agent::{GenerationRequest, Generator, NoTools, RoleConfig};
use scribe_core::{Fragment, ProgressSink};

/// Separator between rendered fragments
pub const FRAGMENT_SEPARATOR: &str = "\n\n---\n\n";

/// Heading used when the publisher is unavailable
pub const FALLBACK_TITLE: &str = "# Technical Documentation\n\n";

/// Rendered fragments in discovery order, joined by [`FRAGMENT_SEPARATOR`]
pub fn join_fragments(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(Fragment::render)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

/// Assemble the final document
///
/// Returns the document and whether the publisher role produced it. On
/// failure the raw fragments are returned under [`FALLBACK_TITLE`].
pub async fn publish(
    generator: &dyn Generator,
    role: &RoleConfig,
    fragments: &[Fragment],
    progress: &ProgressSink,
) -> (String, bool) {
    let joined = join_fragments(fragments);
    progress.agent(format!(
        "Publisher assembling {} fragment(s) into the final document",
        fragments.len()
    ));

    let request = GenerationRequest {
        role,
        directive: prompt::PUBLISHER_DIRECTIVE,
        input: prompt::publisher_input(&joined),
        history: Vec::new(),
        tools: &NoTools,
        progress,
    };

    match generator.generate(request).await {
        Ok(document) => {
            progress.agent(format!("Publisher finished ({} chars)", document.len()));
            (document, true)
        }
        Err(e) => {
            progress.error(format!(
                "Publisher failed: {}. Emitting raw fragments instead.",
                e
            ));
            (format!("{}{}", FALLBACK_TITLE, joined), false)
        }
    }
}
