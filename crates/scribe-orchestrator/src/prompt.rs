//! Role directives and per-invocation inputs
//!
//! Directives are the system prompts of the three roles. Inputs are the user
//! turns built for one invocation.

use scribe_core::FileTarget;

/// System directive for the writer role
pub const WRITER_DIRECTIVE: &str = "You are an expert technical writer documenting one source file of a larger code base.

Produce clear, accurate Markdown documentation for the file you are given:
- Start with a level-3 heading naming the main type or module of the file.
- Write a short overview of its purpose and its role in the project.
- Document each public type, method or endpoint: purpose, parameters, return values and notable errors.
- Use tables for fields and code fences for signatures or examples.

Before writing, use `recall` to look up documentation already produced for related files, and use `read_file` if you need to inspect a file the current one depends on. After writing, use `remember` to store a short summary of the file so later files can refer to it.

Reply with the documentation only, without preamble.";

/// System directive for the reviewer role
pub const REVIEWER_DIRECTIVE: &str = "You are a meticulous senior engineer reviewing documentation written for one source file.

Check the draft against the source (use `read_file` to read it):
- Every public type and method is covered and described correctly.
- Parameters, return values and errors match the code.
- The Markdown is well-formed and readable.

If the draft is accurate and complete, reply with the single word APPROVED.
Otherwise reply with a concise, numbered list of concrete changes the writer must make. Do not rewrite the documentation yourself.";

/// System directive for the publisher role
pub const PUBLISHER_DIRECTIVE: &str = "You are an expert technical writer and document architect. Your task is to take a collection of raw, unordered Markdown documentation snippets for a software project and assemble them into a single, polished and cohesive technical document. The final output must be a single Markdown document.";

/// First writer turn for a file
pub fn writer_input(file: &FileTarget, source: &str) -> String {
    format!(
        "Document the file `{}`.\n\n## Source\n\n```\n{}\n```\n",
        file,
        source.trim_end()
    )
}

/// Writer turn asking for a revision of the previous draft
pub fn revision_input(file: &FileTarget, feedback: &str) -> String {
    format!(
        "A reviewer read your documentation of `{}` and asked for changes:\n\n{}\n\nRevise the documentation to address every point. Reply with the complete revised documentation only.",
        file,
        feedback.trim()
    )
}

/// Reviewer turn for a draft
pub fn reviewer_input(file: &FileTarget, draft: &str) -> String {
    format!(
        "Review the following documentation for `{}`. The source is available with `read_file` at that path.\n\n---\n{}\n---\n",
        file,
        draft.trim()
    )
}

/// Publisher turn over the joined fragments
pub fn publisher_input(snippets: &str) -> String {
    format!(
        "Please assemble the following raw documentation snippets into a final, well-organized technical document.

**Instructions:**
1. **Title:** Start the document with a main title, like `# Technical Documentation for [Project Name]`. Infer the project name from the file paths if possible.
2. **Introduction:** Write a brief, one-paragraph introduction explaining the purpose of the document.
3. **Table of Contents:** Create a \"Table of Contents\" section with links to each major section you create.
4. **Logical Sorting:** Sort the snippets into logical sections by purpose, for example data model, data access, business logic, API layer, configuration, security, data transfer objects, errors, entry point and tests.
5. **Section Headers:** Use a `##` header for each logical section.
6. **Formatting:** Ensure the output is clean, well-formatted Markdown. Use code fences for code and tables where appropriate.
7. **Combine:** Include every snippet under its section. Do not omit any. If a snippet contains an error message, include it as a note under the relevant file.

**Raw Documentation Snippets to process:**
---
{}
---

Now, generate the complete and final Markdown document.",
        snippets
    )
}
