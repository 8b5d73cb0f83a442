use crate::apply::Transaction;
use crate::document::ContextDocument;
use crate::error::{CorpusError, PlanError, Result};
use crate::id::{slugify, ContextId};
use crate::plan::{self, Operation};
use crate::scan::{self, ScanReport};
use crate::sequence::{self, ProjectManifest, SequenceModel};
use crate::{io, mirror, paths, verify};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RemappedId {
    pub from: String,
    pub to: String,
}

/// Outcome of a renumbering operation, for the CLI to present.
#[derive(Debug, Clone, Serialize)]
pub struct RenumberSummary {
    pub operation: String,
    pub project: String,
    pub remapped: Vec<RemappedId>,
    pub edits: usize,
    pub renames: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedContext {
    pub id: ContextId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub id: ContextId,
    pub title: String,
    pub path: PathBuf,
}

/// Full view of a single context, for read-only display.
#[derive(Debug, Clone, Serialize)]
pub struct ContextDetails {
    pub id: ContextId,
    pub project: String,
    pub title: String,
    pub path: PathBuf,
    pub body: String,
}

// ---------------------------------------------------------------------------
// ContextEngine
// ---------------------------------------------------------------------------

/// The four structural operations over a context corpus. Each one loads the
/// sequence fresh from disk, computes a plan, scans for every implied edit,
/// and applies the whole batch through one transaction — or fails without
/// mutating anything.
pub struct ContextEngine {
    root: PathBuf,
    tests_root: Option<PathBuf>,
}

impl ContextEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tests_root: None,
        }
    }

    /// Attach a test scaffold root whose `<id>/` directories and `<id>.rs`
    /// files are kept in lockstep with context IDs.
    pub fn with_tests_root(mut self, tests_root: impl Into<PathBuf>) -> Self {
        self.tests_root = Some(tests_root.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // -----------------------------------------------------------------------
    // Corpus scaffolding
    // -----------------------------------------------------------------------

    pub fn init(&self) -> Result<()> {
        io::ensure_dir(&paths::context_root(&self.root))
    }

    pub fn add_project(&self, name: &str, prefix: &str) -> Result<()> {
        paths::validate_project_name(name)?;
        // Validates the prefix shape as a side effect.
        ContextId::new(prefix, 1)?;

        let dir = paths::project_dir(&self.root, name);
        if dir.exists() {
            return Err(CorpusError::ProjectExists(name.to_string()).into());
        }
        match sequence::project_for_prefix(&self.root, prefix) {
            Ok(owner) => {
                return Err(CorpusError::DuplicatePrefix {
                    prefix: prefix.to_string(),
                    first: owner,
                    second: name.to_string(),
                }
                .into())
            }
            Err(CorpusError::MissingProject(_)) => {}
            Err(e) => return Err(e.into()),
        }

        io::ensure_dir(&dir)?;
        ProjectManifest {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
        .save(&self.root)?;
        io::atomic_write(
            &paths::project_index(&self.root, name),
            format!("# {name} contexts\n").as_bytes(),
        )?;
        info!(project = name, prefix, "added project");
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectManifest>> {
        let mut out = Vec::new();
        for name in sequence::list_projects(&self.root)? {
            out.push(ProjectManifest::load(&self.root, &name)?);
        }
        Ok(out)
    }

    pub fn list_contexts(&self, project: &str) -> Result<Vec<ContextSummary>> {
        let model = SequenceModel::load(&self.root, project)?;
        let mut out = Vec::new();
        for entry in &model.entries {
            let content = std::fs::read_to_string(&entry.path)?;
            let doc = ContextDocument::parse(&entry.path, &content)?;
            out.push(ContextSummary {
                id: entry.id.clone(),
                title: doc.title().unwrap_or(&entry.slug).to_string(),
                path: entry.path.clone(),
            });
        }
        Ok(out)
    }

    /// Look up a single context by ID and return its parsed document.
    pub fn show(&self, id: &ContextId) -> Result<ContextDetails> {
        let (project, model) = self.load_for(id)?;
        let entry = model
            .entry(id)
            .ok_or_else(|| PlanError::UnknownTarget(id.to_string()))?;
        let content = std::fs::read_to_string(&entry.path)?;
        let doc = ContextDocument::parse(&entry.path, &content)?;
        Ok(ContextDetails {
            id: entry.id.clone(),
            project,
            title: doc.title().unwrap_or(&entry.slug).to_string(),
            path: entry.path.clone(),
            body: doc.body,
        })
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Create a new context at the next sequence number. Nothing existing
    /// is renumbered, so this is a single atomic file write.
    pub fn create(&self, project: &str, title: Option<&str>) -> Result<CreatedContext> {
        let model = SequenceModel::load(&self.root, project)?;
        let plan = plan::compute(&model, &Operation::Create)?;
        let id = plan.created.expect("create plan allocates an id");

        let title = title.unwrap_or("Untitled");
        let slug = slugify(title);
        let path = paths::context_file(&self.root, project, &id, &slug);
        let doc = ContextDocument::new(&id, title, project, Utc::now().date_naive());
        io::atomic_write(&path, doc.render()?.as_bytes())?;

        info!(id = %id, path = %path.display(), "created context");
        Ok(CreatedContext { id, path })
    }

    /// Delete a context. With `reorder`, later contexts shift down to close
    /// the gap and every reference to them is rewritten; without it, the
    /// gap stays and references to the deleted ID are reported as warnings.
    pub fn delete(&self, id: &ContextId, reorder: bool) -> Result<RenumberSummary> {
        let (project, model) = self.load_for(id)?;
        self.run(
            &project,
            &model,
            &Operation::Delete {
                target: id.clone(),
                reorder,
            },
            "delete",
        )
    }

    /// Move a context to a 1-based position in its project's order.
    pub fn move_to(&self, id: &ContextId, to: u32) -> Result<RenumberSummary> {
        let (project, model) = self.load_for(id)?;
        self.run(
            &project,
            &model,
            &Operation::Move {
                target: id.clone(),
                to,
            },
            "move",
        )
    }

    /// Compact a project's numbering to a dense 1..N, preserving order.
    pub fn reorder(&self, project: &str) -> Result<RenumberSummary> {
        let model = SequenceModel::load(&self.root, project)?;
        self.run(project, &model, &Operation::Reorder, "reorder")
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn load_for(&self, id: &ContextId) -> Result<(String, SequenceModel)> {
        let project = sequence::project_for_prefix(&self.root, id.prefix())?;
        let model = SequenceModel::load(&self.root, &project)?;
        Ok((project, model))
    }

    fn run(
        &self,
        project: &str,
        model: &SequenceModel,
        op: &Operation,
        name: &str,
    ) -> Result<RenumberSummary> {
        let plan = plan::compute(model, op)?;

        let mut report = scan::scan_corpus(&self.root, model, &plan)?;
        if let Some(tests_root) = &self.tests_root {
            report.merge(mirror::scan_mirrors(tests_root, &plan)?);
        }

        let summary = RenumberSummary {
            operation: name.to_string(),
            project: project.to_string(),
            remapped: plan
                .remap
                .iter()
                .map(|(from, to)| RemappedId {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
            edits: report.edits.len(),
            renames: report.renames.len(),
            warnings: report.warnings.clone(),
        };

        if report.edits.is_empty() && report.renames.is_empty() && report.removals.is_empty() {
            // No-op plans (move to own position, already-dense reorder)
            // touch nothing on disk.
            return Ok(summary);
        }

        let subtrees = self.affected_subtrees(&report);
        let tx = Transaction::stage(&subtrees, &report)?;
        let ctx_root = paths::context_root(&self.root);
        for (live, staged) in tx.staged_roots() {
            if live.starts_with(&ctx_root) {
                verify::check_project_tree(staged)?;
            }
        }
        tx.commit()?;

        info!(
            operation = name,
            project,
            remapped = summary.remapped.len(),
            edits = summary.edits,
            "renumber committed"
        );
        Ok(summary)
    }

    /// Minimal set of directory subtrees the transaction must stage: one
    /// per touched project, plus the tests root when mirrors are involved.
    fn affected_subtrees(&self, report: &ScanReport) -> Vec<PathBuf> {
        let ctx_root = paths::context_root(&self.root);
        let mut set: BTreeSet<PathBuf> = BTreeSet::new();

        let mut add = |p: &Path| {
            if let Ok(rel) = p.strip_prefix(&ctx_root) {
                if let Some(first) = rel.components().next() {
                    set.insert(ctx_root.join(first.as_os_str()));
                    return;
                }
            }
            if let Some(tests_root) = &self.tests_root {
                if p.starts_with(tests_root) {
                    set.insert(tests_root.clone());
                }
            }
        };

        for e in &report.edits {
            add(&e.path);
        }
        for r in &report.renames {
            add(&r.from);
        }
        for p in &report.removals {
            add(p);
        }
        set.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
