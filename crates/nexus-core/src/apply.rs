use crate::error::ApplyError;
use crate::scan::ScanReport;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A staged unit of change over one or more live subtrees.
///
/// Protocol: [`Transaction::stage`] copies every affected subtree into a
/// staging directory beside it and applies all removals, content edits, and
/// renames there. The caller then validates the staged trees (via
/// [`Transaction::staged`]) and calls [`Transaction::commit`], which swaps
/// each subtree into place with directory-level renames. Dropping an
/// uncommitted transaction discards staging; the live corpus is never
/// touched before commit.
#[derive(Debug)]
pub struct Transaction {
    /// (live subtree, staging tempdir, staged copy inside it)
    subtrees: Vec<(PathBuf, TempDir, PathBuf)>,
}

impl Transaction {
    /// Copy `subtrees` into staging and apply everything in `report`.
    ///
    /// Every path in the report must fall under one of the subtrees.
    /// Renames go through temporary names first, so remaps that permute
    /// IDs (a three-way move) cannot collide mid-application.
    pub fn stage(subtrees: &[PathBuf], report: &ScanReport) -> Result<Self, ApplyError> {
        let mut staged = Vec::new();
        for live in subtrees {
            let parent = live.parent().unwrap_or(Path::new("."));
            let staging = tempfile::Builder::new()
                .prefix(".nexus-staging-")
                .tempdir_in(parent)
                .map_err(ApplyError::Staging)?;
            let copy = staging.path().join("tree");
            crate::io::copy_dir_all(live, &copy).map_err(ApplyError::Staging)?;
            debug!(live = %live.display(), staged = %copy.display(), "staged subtree");
            staged.push((live.clone(), staging, copy));
        }

        let tx = Self { subtrees: staged };
        tx.apply_removals(report)?;
        tx.apply_edits(report)?;
        tx.apply_renames(report)?;
        Ok(tx)
    }

    /// Rebase a live path into its staged copy. `None` if the path is not
    /// under any staged subtree.
    pub fn staged(&self, live: &Path) -> Option<PathBuf> {
        self.subtrees.iter().find_map(|(root, _, copy)| {
            live.strip_prefix(root).ok().map(|rel| copy.join(rel))
        })
    }

    fn require_staged(&self, live: &Path) -> Result<PathBuf, ApplyError> {
        self.staged(live).ok_or_else(|| {
            ApplyError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("path outside staged subtrees: {}", live.display()),
            ))
        })
    }

    /// Staged roots, for invariant re-validation before commit.
    pub fn staged_roots(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.subtrees
            .iter()
            .map(|(live, _, copy)| (live.as_path(), copy.as_path()))
    }

    fn apply_removals(&self, report: &ScanReport) -> Result<(), ApplyError> {
        for path in &report.removals {
            let staged = self.require_staged(path)?;
            if staged.is_dir() {
                std::fs::remove_dir_all(&staged)?;
            } else {
                std::fs::remove_file(&staged)?;
            }
        }
        Ok(())
    }

    fn apply_edits(&self, report: &ScanReport) -> Result<(), ApplyError> {
        // Group per file, apply back-to-front so earlier ranges stay valid.
        let mut by_file: BTreeMap<&PathBuf, Vec<&crate::scan::Edit>> = BTreeMap::new();
        for edit in &report.edits {
            by_file.entry(&edit.path).or_default().push(edit);
        }

        for (path, mut edits) in by_file {
            let staged = self.require_staged(path)?;
            let mut content = std::fs::read_to_string(&staged)?;
            edits.sort_by_key(|e| std::cmp::Reverse(e.range.start));
            for edit in edits {
                if content.get(edit.range.clone()) != Some(edit.old.as_str()) {
                    return Err(ApplyError::StaleEdit {
                        path: path.clone(),
                        expected: edit.old.clone(),
                    });
                }
                content.replace_range(edit.range.clone(), &edit.new);
            }
            std::fs::write(&staged, content)?;
        }
        Ok(())
    }

    fn apply_renames(&self, report: &ScanReport) -> Result<(), ApplyError> {
        // Phase one: move every source aside under a temporary name.
        let mut pending = Vec::new();
        for (i, op) in report.renames.iter().enumerate() {
            let from = self.require_staged(&op.from)?;
            let to = self.require_staged(&op.to)?;
            let tmp = from.with_file_name(format!(".renumber-tmp-{i}"));
            std::fs::rename(&from, &tmp)?;
            pending.push((tmp, to));
        }
        // Phase two: settle into final names.
        for (tmp, to) in pending {
            std::fs::rename(&tmp, &to)?;
        }
        Ok(())
    }

    /// Atomically swap every staged subtree into place. Each subtree is a
    /// single directory-level rename pair, so there is no window where a
    /// subtree mixes old and new files. A failure here is surfaced and
    /// never retried: the failing subtree's staging directory (holding the
    /// displaced live tree under `backup/`) is kept on disk and named in
    /// the error, so the operator can restore it by hand. Subtrees not yet
    /// swapped keep their live state untouched.
    pub fn commit(self) -> Result<(), ApplyError> {
        for (live, staging, copy) in self.subtrees {
            let backup = staging.path().join("backup");
            if let Err(source) = std::fs::rename(&live, &backup) {
                return Err(ApplyError::SwapFailed {
                    path: live,
                    staging: staging.keep(),
                    source,
                });
            }
            if let Err(source) = std::fs::rename(&copy, &live) {
                return Err(ApplyError::SwapFailed {
                    path: live,
                    staging: staging.keep(),
                    source,
                });
            }
            debug!(live = %live.display(), "committed subtree");
            // On success the staging dir, now holding only the displaced
            // old tree, is cleaned up when the TempDir drops here.
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{Edit, RenameOp};
    use tempfile::TempDir;

    fn seed_tree(root: &Path) -> PathBuf {
        let tree = root.join("corpus");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("NEX_001-a.md"), "id NEX_001 here").unwrap();
        std::fs::write(tree.join("NEX_002-b.md"), "id NEX_002 here").unwrap();
        tree
    }

    fn snapshot(dir: &Path) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        for name in names {
            let content = std::fs::read_to_string(dir.join(&name)).unwrap_or_default();
            out.push((name, content));
        }
        out
    }

    #[test]
    fn stage_edit_commit() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());

        let report = ScanReport {
            edits: vec![Edit {
                path: tree.join("NEX_001-a.md"),
                range: 3..10,
                old: "NEX_001".to_string(),
                new: "NEX_003".to_string(),
            }],
            ..Default::default()
        };
        let tx = Transaction::stage(&[tree.clone()], &report).unwrap();
        // Live tree untouched while staged
        assert_eq!(
            std::fs::read_to_string(tree.join("NEX_001-a.md")).unwrap(),
            "id NEX_001 here"
        );
        tx.commit().unwrap();
        assert_eq!(
            std::fs::read_to_string(tree.join("NEX_001-a.md")).unwrap(),
            "id NEX_003 here"
        );
    }

    #[test]
    fn dropped_transaction_leaves_live_tree_byte_identical() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());
        let before = snapshot(&tree);

        let report = ScanReport {
            edits: vec![Edit {
                path: tree.join("NEX_001-a.md"),
                range: 3..10,
                old: "NEX_001".to_string(),
                new: "NEX_009".to_string(),
            }],
            removals: vec![tree.join("NEX_002-b.md")],
            ..Default::default()
        };
        let tx = Transaction::stage(&[tree.clone()], &report).unwrap();
        drop(tx); // simulated failure after staging, before swap

        assert_eq!(snapshot(&tree), before);
        // No staging debris left behind
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(".nexus-staging"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn stale_edit_is_rejected() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());

        let report = ScanReport {
            edits: vec![Edit {
                path: tree.join("NEX_001-a.md"),
                range: 3..10,
                old: "WRONG_99".to_string(),
                new: "NEX_003".to_string(),
            }],
            ..Default::default()
        };
        let err = Transaction::stage(&[tree], &report).unwrap_err();
        assert!(matches!(err, ApplyError::StaleEdit { .. }));
    }

    #[test]
    fn permuting_renames_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());

        // Swap the two files' names — naive sequential renames would clobber.
        let report = ScanReport {
            renames: vec![
                RenameOp {
                    from: tree.join("NEX_001-a.md"),
                    to: tree.join("NEX_002-a.md"),
                },
                RenameOp {
                    from: tree.join("NEX_002-b.md"),
                    to: tree.join("NEX_001-b.md"),
                },
            ],
            ..Default::default()
        };
        Transaction::stage(&[tree.clone()], &report)
            .unwrap()
            .commit()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(tree.join("NEX_002-a.md")).unwrap(),
            "id NEX_001 here"
        );
        assert_eq!(
            std::fs::read_to_string(tree.join("NEX_001-b.md")).unwrap(),
            "id NEX_002 here"
        );
    }

    #[test]
    fn swap_failure_keeps_displaced_tree_recoverable() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());
        let before = snapshot(&tree);

        let report = ScanReport {
            edits: vec![Edit {
                path: tree.join("NEX_001-a.md"),
                range: 3..10,
                old: "NEX_001".to_string(),
                new: "NEX_003".to_string(),
            }],
            ..Default::default()
        };
        let tx = Transaction::stage(&[tree.clone()], &report).unwrap();
        // Sabotage the staged copy so the second swap rename fails after
        // the live tree has already been moved aside.
        let staged_root = tx.staged(&tree).unwrap();
        std::fs::remove_dir_all(&staged_root).unwrap();

        let err = tx.commit().unwrap_err();
        let staging = match err {
            ApplyError::SwapFailed { staging, .. } => staging,
            other => panic!("unexpected error: {other}"),
        };

        // The live path is gone, but the displaced tree survives under the
        // kept staging directory and can be renamed back into place.
        assert!(!tree.exists());
        let backup = staging.join("backup");
        assert_eq!(snapshot(&backup), before);
        std::fs::rename(&backup, &tree).unwrap();
        assert_eq!(snapshot(&tree), before);
    }

    #[test]
    fn removals_remove_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        let tree = seed_tree(dir.path());
        std::fs::create_dir_all(tree.join("NEX_001")).unwrap();
        std::fs::write(tree.join("NEX_001/case.rs"), "x").unwrap();

        let report = ScanReport {
            removals: vec![tree.join("NEX_002-b.md"), tree.join("NEX_001")],
            ..Default::default()
        };
        Transaction::stage(&[tree.clone()], &report)
            .unwrap()
            .commit()
            .unwrap();

        assert!(!tree.join("NEX_002-b.md").exists());
        assert!(!tree.join("NEX_001").exists());
        assert!(tree.join("NEX_001-a.md").exists());
    }

    #[test]
    fn multiple_subtrees_swap_together() {
        let dir = TempDir::new().unwrap();
        let corpus = seed_tree(dir.path());
        let tests = dir.path().join("tests");
        std::fs::create_dir_all(&tests).unwrap();
        std::fs::write(tests.join("NEX_001.rs"), "//! NEX_001").unwrap();

        let report = ScanReport {
            edits: vec![Edit {
                path: tests.join("NEX_001.rs"),
                range: 4..11,
                old: "NEX_001".to_string(),
                new: "NEX_002".to_string(),
            }],
            renames: vec![RenameOp {
                from: tests.join("NEX_001.rs"),
                to: tests.join("NEX_002.rs"),
            }],
            ..Default::default()
        };
        Transaction::stage(&[corpus, tests.clone()], &report)
            .unwrap()
            .commit()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(tests.join("NEX_002.rs")).unwrap(),
            "//! NEX_002"
        );
    }
}
