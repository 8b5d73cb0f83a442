use crate::error::CorpusError;
use crate::id::ContextId;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CONTEXT_DIR: &str = ".context";
pub const PROJECT_MANIFEST: &str = "project.yaml";
pub const INDEX_FILE: &str = "index.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn context_root(root: &Path) -> PathBuf {
    root.join(CONTEXT_DIR)
}

pub fn project_dir(root: &Path, project: &str) -> PathBuf {
    context_root(root).join(project)
}

pub fn project_manifest(root: &Path, project: &str) -> PathBuf {
    project_dir(root, project).join(PROJECT_MANIFEST)
}

pub fn project_index(root: &Path, project: &str) -> PathBuf {
    project_dir(root, project).join(INDEX_FILE)
}

pub fn context_file(root: &Path, project: &str, id: &ContextId, slug: &str) -> PathBuf {
    project_dir(root, project).join(id.filename(slug))
}

/// Test-mirror directory for a context: `<tests_root>/<id>/`.
pub fn mirror_dir(tests_root: &Path, id: &ContextId) -> PathBuf {
    tests_root.join(id.to_string())
}

/// Test-mirror entry-point file for a context: `<tests_root>/<id>.rs`.
pub fn mirror_file(tests_root: &Path, id: &ContextId) -> PathBuf {
    tests_root.join(format!("{id}.rs"))
}

// ---------------------------------------------------------------------------
// Project name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_project_name(name: &str) -> std::result::Result<(), CorpusError> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(CorpusError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

/// Directories that are never treated as projects: dotted (staging,
/// VCS noise) and `_`-prefixed reference material.
pub fn is_reserved_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
