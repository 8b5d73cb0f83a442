use crate::error::{EngineError, ScanError};
use crate::id::{id_token_re, ContextId};
use crate::plan::RenumberPlan;
use crate::sequence::{self, SequenceModel};
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Edit primitives
// ---------------------------------------------------------------------------

/// A single textual replacement, located by byte range in the original file
/// content. Ranges never overlap within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub path: PathBuf,
    pub range: Range<usize>,
    pub old: String,
    pub new: String,
}

/// A file or directory whose name encodes an ID and must be renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything a plan implies on disk: content edits, renames, removals,
/// plus warnings for references left dangling by a delete.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub edits: Vec<Edit>,
    pub renames: Vec<RenameOp>,
    pub removals: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl ScanReport {
    pub fn merge(&mut self, other: ScanReport) {
        self.edits.extend(other.edits);
        self.renames.extend(other.renames);
        self.removals.extend(other.removals);
        self.warnings.extend(other.warnings);
    }
}

// ---------------------------------------------------------------------------
// Corpus scan
// ---------------------------------------------------------------------------

/// Scan the whole corpus for occurrences implied by `plan`: the renumbered
/// contexts' own frontmatter and headers, cross-references in every other
/// markdown file (including `index.md`), and the renames of files whose
/// name encodes a remapped ID.
///
/// Scanning is deterministic: files are visited in sorted order and the
/// same remap always yields the same report.
pub fn scan_corpus(
    root: &Path,
    model: &SequenceModel,
    plan: &RenumberPlan,
) -> Result<ScanReport, EngineError> {
    let remap = token_map(plan);
    let removed_token = plan.removed.as_ref().map(|id| id.to_string());
    let removed_path = plan
        .removed
        .as_ref()
        .and_then(|id| model.entry(id))
        .map(|e| e.path.clone());

    let mut report = ScanReport::default();

    for project in sequence::list_projects(root)? {
        let dir = crate::paths::project_dir(root, &project);
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(EngineError::Io)? {
            let entry = entry.map_err(EngineError::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("md") {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            if Some(&path) == removed_path.as_ref() {
                continue;
            }
            scan_file(
                &path,
                &remap,
                removed_token.as_deref(),
                &mut report,
            )?;
        }
    }

    // Renames for context files whose name encodes a remapped ID.
    for (old, new) in &plan.remap {
        if let Some(entry) = model.entry(old) {
            let dir = entry.path.parent().unwrap_or(Path::new("."));
            report.renames.push(RenameOp {
                from: entry.path.clone(),
                to: dir.join(new.filename(&entry.slug)),
            });
        }
    }

    if let Some(path) = removed_path {
        report.removals.push(path);
    }

    Ok(report)
}

/// Scan one file for remapped and dangling ID tokens. Shared by the corpus
/// scan and the test-scaffold mirror.
pub(crate) fn scan_file(
    path: &Path,
    remap: &HashMap<String, String>,
    removed_token: Option<&str>,
    report: &mut ScanReport,
) -> Result<(), EngineError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScanError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut dangling = 0usize;
    for m in id_token_re().find_iter(&content) {
        let token = m.as_str();
        if let Some(new) = remap.get(token) {
            report.edits.push(Edit {
                path: path.to_path_buf(),
                range: m.range(),
                old: token.to_string(),
                new: new.clone(),
            });
            continue;
        }
        let Ok(id) = token.parse::<ContextId>() else {
            continue;
        };
        let canonical = id.to_string();
        // A wide zero-padded rendering of a remapped ID would silently
        // escape the rewrite; refuse rather than guess.
        if canonical != token && remap.contains_key(&canonical) {
            return Err(ScanError::AmbiguousMatch {
                path: path.to_path_buf(),
                reason: format!("{token} is a non-canonical rendering of remapped {canonical}"),
            }
            .into());
        }
        if Some(canonical.as_str()) == removed_token {
            dangling += 1;
        }
    }
    if dangling > 0 {
        report.warnings.push(format!(
            "{}: {dangling} dangling reference(s) to deleted {}",
            path.display(),
            removed_token.unwrap_or_default()
        ));
    }
    Ok(())
}

/// Exact-token lookup table: canonical old rendering → canonical new.
pub(crate) fn token_map(plan: &RenumberPlan) -> HashMap<String, String> {
    plan.remap
        .iter()
        .map(|(old, new)| (old.to_string(), new.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
