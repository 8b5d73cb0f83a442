use crate::error::CorpusError;
use crate::id::ContextId;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ProjectManifest
// ---------------------------------------------------------------------------

/// `project.yaml` at the root of each project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub name: String,
    pub prefix: String,
}

impl ProjectManifest {
    pub fn load(root: &Path, project: &str) -> std::result::Result<Self, CorpusError> {
        let path = paths::project_manifest(root, project);
        if !path.exists() {
            return Err(CorpusError::BadManifest {
                path,
                reason: "project.yaml missing".to_string(),
            });
        }
        let data = std::fs::read_to_string(&path)?;
        let manifest: ProjectManifest = serde_yaml::from_str(&data)?;
        Ok(manifest)
    }

    pub fn save(&self, root: &Path) -> crate::error::Result<()> {
        let path = paths::project_manifest(root, &self.name);
        let data = serde_yaml::to_string(self).map_err(CorpusError::from)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// SequenceModel
// ---------------------------------------------------------------------------

/// One slot in a project's ordered sequence.
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    pub id: ContextId,
    pub slug: String,
    pub path: PathBuf,
}

impl SequenceEntry {
    pub fn seq(&self) -> u32 {
        self.id.seq()
    }
}

/// In-memory view of a project's contexts, ordered by sequence number.
/// Loaded fresh for every operation — there is no cached "next id" counter.
#[derive(Debug, Clone)]
pub struct SequenceModel {
    pub project: String,
    pub prefix: String,
    pub entries: Vec<SequenceEntry>,
}

impl SequenceModel {
    /// Load the current sequence for `project`. Fails if the project
    /// directory is missing or two files claim the same sequence number —
    /// duplicates are surfaced to the operator, never auto-healed.
    pub fn load(root: &Path, project: &str) -> std::result::Result<Self, CorpusError> {
        let dir = paths::project_dir(root, project);
        if !dir.is_dir() {
            return Err(CorpusError::MissingProject(project.to_string()));
        }
        let manifest = ProjectManifest::load(root, project)?;

        let mut entries: Vec<SequenceEntry> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for name in names {
            let Some((id, slug)) = ContextId::parse_filename(&name) else {
                continue;
            };
            if let Some(existing) = entries.iter().find(|e| e.seq() == id.seq()) {
                return Err(CorpusError::DuplicateId {
                    id: id.to_string(),
                    project: project.to_string(),
                    first: existing.path.clone(),
                    second: dir.join(&name),
                });
            }
            entries.push(SequenceEntry {
                id,
                slug,
                path: dir.join(&name),
            });
        }
        entries.sort_by_key(|e| e.seq());

        Ok(Self {
            project: project.to_string(),
            prefix: manifest.prefix,
            entries,
        })
    }

    /// Smallest unused sequence number with append semantics: always
    /// `max + 1`, gaps are never filled.
    pub fn next_sequence(&self) -> u32 {
        self.entries.last().map(|e| e.seq() + 1).unwrap_or(1)
    }

    pub fn entry(&self, id: &ContextId) -> Option<&SequenceEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// 1-based rank of `id` in the ordered sequence.
    pub fn position(&self, id: &ContextId) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| &e.id == id)
            .map(|i| i as u32 + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Corpus-level queries
// ---------------------------------------------------------------------------

/// List project directory names under the corpus root, sorted. Reserved
/// directories (`_`-prefixed reference material, dot-dirs) are skipped.
pub fn list_projects(root: &Path) -> std::result::Result<Vec<String>, CorpusError> {
    let ctx_root = paths::context_root(root);
    if !ctx_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut projects = Vec::new();
    for entry in std::fs::read_dir(&ctx_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if paths::is_reserved_dir(&name) {
            continue;
        }
        projects.push(name);
    }
    projects.sort();
    Ok(projects)
}

/// Resolve the project that owns `prefix`. Prefix uniqueness across the
/// corpus is an invariant; a collision is fatal.
pub fn project_for_prefix(root: &Path, prefix: &str) -> std::result::Result<String, CorpusError> {
    let mut owner: Option<String> = None;
    for project in list_projects(root)? {
        let manifest = ProjectManifest::load(root, &project)?;
        if manifest.prefix == prefix {
            if let Some(first) = owner {
                return Err(CorpusError::DuplicatePrefix {
                    prefix: prefix.to_string(),
                    first,
                    second: project,
                });
            }
            owner = Some(project);
        }
    }
    owner.ok_or_else(|| CorpusError::MissingProject(format!("prefix {prefix}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
