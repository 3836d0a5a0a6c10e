//! Tool sandbox - rooted file access and memory operations
//!
//! All paths handed to the sandbox are relative to the project root. Absolute
//! paths and `..` components are rejected lexically before any I/O; resolved
//! paths are then canonicalized so a symlink cannot lead outside the root.

use scribe_core::{FileTarget, Result, ScribeError};
use scribe_memory::MemoryStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Names the writer may never overwrite
pub const DEFAULT_PROTECTED_FILES: &[&str] =
    &[".git", ".scribe", ".env", "Cargo.lock", ".secrets", ".gitignore"];

/// Returned by `recall` when memory holds nothing relevant
pub const NO_MEMORY_MATCHES: &str = "No relevant information found in memory.";

/// Separator between recalled chunks
pub const RECALL_SEPARATOR: &str = "\n---\n";

/// File I/O and memory access rooted at one project directory
#[derive(Debug, Clone)]
pub struct ToolSandbox {
    root: PathBuf,
    memory: Arc<MemoryStore>,
    protected_files: Vec<String>,
    extension: String,
    recall_k: usize,
}

impl ToolSandbox {
    /// Root the sandbox at `root`, which must be an existing directory
    pub fn new(root: impl AsRef<Path>, memory: Arc<MemoryStore>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ScribeError::Listing(format!(
                "Project path does not exist or is not a directory: {}",
                root.display()
            )));
        }

        let root = root.canonicalize()?;
        Ok(Self {
            root,
            memory,
            protected_files: DEFAULT_PROTECTED_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extension: "java".to_string(),
            recall_k: 3,
        })
    }

    pub fn with_protected_files(mut self, protected: Vec<String>) -> Self {
        self.protected_files = protected;
        self
    }

    /// Extension used by the `list_files` tool (with or without the dot)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_recall_k(mut self, k: usize) -> Self {
        self.recall_k = k;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Relative paths of every file ending in `.{extension}`, sorted by name
    /// at each directory level
    pub fn list(&self, extension: &str) -> Result<Vec<FileTarget>> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        let mut targets = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ScribeError::Listing(format!(
                        "Cannot walk {}: {}",
                        self.root.display(),
                        e
                    )));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(&suffix) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            targets.push(FileTarget::new(relative));
        }

        tracing::debug!("Listed {} '{}' file(s)", targets.len(), suffix);
        Ok(targets)
    }

    /// Full text of a file under the root
    pub fn read(&self, path: &str) -> Result<String> {
        let relative = validate_path(path)?;
        let full = self.root.join(&relative);
        self.ensure_ancestor_contained(&full)?;

        if !full.exists() {
            return Err(ScribeError::NotFound(path.to_string()));
        }
        self.ensure_contained(&full)?;

        fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScribeError::NotFound(path.to_string()),
            _ => ScribeError::Io(e.to_string()),
        })
    }

    /// Write `content` to a file under the root
    ///
    /// Returns `true` if the file was created, `false` if it was replaced.
    pub fn write(&self, path: &str, content: &str) -> Result<bool> {
        let relative = validate_path(path)?;
        self.check_protected(&relative)?;

        let full = self.root.join(&relative);
        self.ensure_ancestor_contained(&full)?;

        let created = !full.exists();
        if !created {
            self.ensure_contained(&full)?;
        }

        if let Some(parent) = full.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ScribeError::Io(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                tracing::info!("Created directory: {}", parent.display());
            }
            self.ensure_contained(parent)?;
        }

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ScribeError::PathValidation(format!("Not a file path: {}", path)))?;
        let temp = full.with_file_name(format!(".{}.scribe-tmp", file_name));

        fs::write(&temp, content)
            .map_err(|e| ScribeError::Io(format!("Failed to write file {}: {}", path, e)))?;
        if let Err(e) = fs::rename(&temp, &full) {
            let _ = fs::remove_file(&temp);
            return Err(ScribeError::Io(format!(
                "Failed to move file into place {}: {}",
                path, e
            )));
        }

        if created {
            tracing::info!("Created file: {}", path);
        } else {
            tracing::info!("Modified file: {}", path);
        }
        Ok(created)
    }

    /// Commit `content` to memory under `source_tag`; returns chunks added
    pub fn remember(&self, content: &str, source_tag: &str) -> Result<usize> {
        self.memory.insert(content, source_tag)
    }

    /// Recalled chunks joined by [`RECALL_SEPARATOR`], or [`NO_MEMORY_MATCHES`]
    pub fn recall(&self, query: &str) -> Result<String> {
        let matches = self.memory.search(query, self.recall_k)?;
        if matches.is_empty() {
            return Ok(NO_MEMORY_MATCHES.to_string());
        }

        Ok(matches
            .into_iter()
            .map(|chunk| chunk.text)
            .collect::<Vec<_>>()
            .join(RECALL_SEPARATOR))
    }

    fn check_protected(&self, relative: &Path) -> Result<()> {
        for component in relative.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            let name = name.to_string_lossy();
            if self.protected_files.iter().any(|p| p == name.as_ref()) {
                return Err(ScribeError::PathValidation(format!(
                    "Cannot write to protected file: {}",
                    relative.display()
                )));
            }
        }
        Ok(())
    }

    /// Containment of the deepest part of `full` that already exists
    ///
    /// Runs before any directory is created, so a symlinked component cannot
    /// make the sandbox touch anything outside the root.
    fn ensure_ancestor_contained(&self, full: &Path) -> Result<()> {
        let Some(existing) = full
            .ancestors()
            .find(|p| fs::symlink_metadata(p).is_ok())
        else {
            return Err(ScribeError::PathValidation(format!(
                "No existing ancestor for {}",
                full.display()
            )));
        };

        let resolved = existing.canonicalize().map_err(|_| {
            ScribeError::PathValidation(format!("Cannot resolve {}", existing.display()))
        })?;
        if !resolved.starts_with(&self.root) {
            return Err(ScribeError::PathValidation(format!(
                "Path escapes project root: {}",
                full.display()
            )));
        }
        Ok(())
    }

    fn ensure_contained(&self, full: &Path) -> Result<()> {
        let resolved = full.canonicalize()?;
        if !resolved.starts_with(&self.root) {
            return Err(ScribeError::PathValidation(format!(
                "Path escapes project root: {}",
                full.display()
            )));
        }
        Ok(())
    }
}

/// Lexical check of a sandbox path: relative, no `..`, not empty
pub fn validate_path(path: &str) -> Result<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(ScribeError::PathValidation("Empty path".to_string()));
    }

    let path = Path::new(trimmed);

    // Reject absolute paths
    if path.is_absolute() || path.has_root() {
        return Err(ScribeError::PathValidation(format!(
            "Absolute paths not allowed: {}",
            path.display()
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(ScribeError::PathValidation(format!(
                    "Path traversal not allowed: {}",
                    path.display()
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(ScribeError::PathValidation(format!(
                    "Absolute paths not allowed: {}",
                    path.display()
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(path.to_path_buf())
}
