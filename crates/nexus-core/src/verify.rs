use crate::document::ContextDocument;
use crate::error::ApplyError;
use crate::id::ContextId;
use std::collections::BTreeMap;
use std::path::Path;

/// Re-check the corpus invariants against a (staged) project directory:
/// unique sequence numbers, frontmatter `context_id` matching the
/// filename-derived ID, and an H1 header echoing it.
///
/// Runs between staging and commit so a bad plan can never reach the live
/// corpus; the violated invariant and offending file are reported verbatim.
pub fn check_project_tree(dir: &Path) -> Result<(), ApplyError> {
    let mut seen: BTreeMap<u32, std::path::PathBuf> = BTreeMap::new();

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    for name in names {
        let Some((id, _slug)) = ContextId::parse_filename(&name) else {
            continue;
        };
        let path = dir.join(&name);

        if seen.insert(id.seq(), path.clone()).is_some() {
            return Err(ApplyError::StagedInvariant {
                invariant: format!("unique sequence number {}", id.seq()),
                path,
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let doc = ContextDocument::parse(&path, &content).map_err(|_| {
            ApplyError::StagedInvariant {
                invariant: "parseable frontmatter".to_string(),
                path: path.clone(),
            }
        })?;

        if doc.context_id().as_ref() != Some(&id) {
            return Err(ApplyError::StagedInvariant {
                invariant: format!("frontmatter context_id matches filename id {id}"),
                path,
            });
        }
        if doc.h1_id().as_ref() != Some(&id) {
            return Err(ApplyError::StagedInvariant {
                invariant: format!("h1 header matches id {id}"),
                path,
            });
        }
    }
    Ok(())
}
