use crate::error::EngineError;
use crate::id::ContextId;
use crate::plan::RenumberPlan;
use crate::scan::{self, RenameOp, ScanReport};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Test scaffold mirror
// ---------------------------------------------------------------------------

/// Scan the test scaffold for artifacts named after context IDs and produce
/// the renames and in-file edits implied by `plan`. The result is folded
/// into the same transaction as the corpus edits, so context files and
/// their test mirrors cannot drift.
///
/// Mirrors take two shapes under the tests root: a directory `<id>/` and an
/// entry-point file `<id>.rs`. Doc-comment ID strings inside mirror files
/// get the same exact-token rewrite as corpus cross-references.
pub fn scan_mirrors(tests_root: &Path, plan: &RenumberPlan) -> Result<ScanReport, EngineError> {
    let mut report = ScanReport::default();
    if !tests_root.is_dir() {
        return Ok(report);
    }

    let remap = scan::token_map(plan);
    let removed_token = plan.removed.as_ref().map(|id| id.to_string());

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(tests_root).map_err(EngineError::Io)? {
        let entry = entry.map_err(EngineError::Io)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut scan_targets: Vec<PathBuf> = Vec::new();
    for name in &names {
        let path = tests_root.join(name);
        let Some(id) = mirror_id(name) else {
            continue;
        };

        if Some(id.to_string()) == removed_token {
            report.removals.push(path);
            continue;
        }
        if let Some(new) = plan.new_id(&id) {
            let new_name = if name.ends_with(".rs") {
                format!("{new}.rs")
            } else {
                new.to_string()
            };
            report.renames.push(RenameOp {
                from: path.clone(),
                to: tests_root.join(new_name),
            });
        }
        collect_rust_files(&path, &mut scan_targets)?;
    }

    scan_targets.sort();
    for path in scan_targets {
        scan::scan_file(&path, &remap, removed_token.as_deref(), &mut report)?;
    }
    Ok(report)
}

/// Interpret a directory entry name as a mirror: `PREFIX_NNN` or
/// `PREFIX_NNN.rs`, nothing else. Trailing garbage (`NEX_001-old.rs`)
/// fails the ID parse and is ignored.
fn mirror_id(name: &str) -> Option<ContextId> {
    let stem = name.strip_suffix(".rs").unwrap_or(name);
    stem.parse().ok()
}

fn collect_rust_files(path: &Path, out: &mut Vec<PathBuf>) -> Result<(), EngineError> {
    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            out.push(path.to_path_buf());
        }
        return Ok(());
    }
    for entry in std::fs::read_dir(path).map_err(EngineError::Io)? {
        let entry = entry.map_err(EngineError::Io)?;
        collect_rust_files(&entry.path(), out)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn remap_plan(pairs: &[(&str, &str)]) -> RenumberPlan {
        RenumberPlan {
            remap: pairs
                .iter()
                .map(|(o, n)| {
                    (
                        o.parse::<ContextId>().unwrap(),
                        n.parse::<ContextId>().unwrap(),
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn renames_mirror_dir_and_entry_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("NEX_002")).unwrap();
        std::fs::write(
            dir.path().join("NEX_002/flow.rs"),
            "//! Covers NEX_002.\n#[test]\nfn works() {}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("NEX_002.rs"), "//! Entry for NEX_002\n").unwrap();

        let plan = remap_plan(&[("NEX_002", "NEX_001")]);
        let report = scan_mirrors(dir.path(), &plan).unwrap();

        let renamed: Vec<String> = report
            .renames
            .iter()
            .map(|r| r.to.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(renamed.contains(&"NEX_001".to_string()));
        assert!(renamed.contains(&"NEX_001.rs".to_string()));
        // Two doc-comment edits, one per file
        assert_eq!(report.edits.len(), 2);
    }

    #[test]
    fn removed_context_drops_its_mirrors() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("NEX_003")).unwrap();
        std::fs::write(dir.path().join("NEX_003.rs"), "//! NEX_003\n").unwrap();

        let plan = RenumberPlan {
            removed: Some("NEX_003".parse().unwrap()),
            ..Default::default()
        };
        let report = scan_mirrors(dir.path(), &plan).unwrap();
        assert_eq!(report.removals.len(), 2);
        assert!(report.renames.is_empty());
    }

    #[test]
    fn unrelated_entries_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("common.rs"), "// helpers, no ids\n").unwrap();
        std::fs::write(dir.path().join("NEX_001-old.rs"), "//! NEX_001\n").unwrap();
        std::fs::create_dir_all(dir.path().join("fixtures")).unwrap();

        let plan = remap_plan(&[("NEX_001", "NEX_002")]);
        let report = scan_mirrors(dir.path(), &plan).unwrap();
        assert!(report.renames.is_empty());
        assert!(report.removals.is_empty());
    }

    #[test]
    fn missing_tests_root_is_empty_report() {
        let dir = TempDir::new().unwrap();
        let plan = remap_plan(&[("NEX_001", "NEX_002")]);
        let report = scan_mirrors(&dir.path().join("nope"), &plan).unwrap();
        assert!(report.edits.is_empty() && report.renames.is_empty());
    }
}
