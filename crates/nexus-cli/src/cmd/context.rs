use crate::output::{print_json, print_summary, print_table};
use anyhow::Context;
use clap::Subcommand;
use nexus_core::{ContextEngine, ContextId};
use std::path::Path;

#[derive(Subcommand)]
pub enum ContextSubcommand {
    /// Create a new context in a project
    Create {
        project: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Show a single context
    Show { id: String },
    /// Delete a context
    Delete {
        id: String,
        /// Leave a gap instead of shifting later contexts down
        #[arg(long)]
        no_reorder: bool,
        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Move a context to a new position (1-based)
    Move { id: String, to: u32 },
    /// Compact a project's numbering, removing gaps
    Reorder { project: String },
    /// List contexts
    List { project: Option<String> },
}

fn engine(root: &Path) -> ContextEngine {
    ContextEngine::new(root).with_tests_root(root.join("tests"))
}

pub fn run(root: &Path, subcmd: ContextSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContextSubcommand::Create { project, title } => create(root, &project, title.as_deref(), json),
        ContextSubcommand::Show { id } => show(root, &id, json),
        ContextSubcommand::Delete {
            id,
            no_reorder,
            force,
        } => delete(root, &id, !no_reorder, force, json),
        ContextSubcommand::Move { id, to } => move_context(root, &id, to, json),
        ContextSubcommand::Reorder { project } => reorder(root, &project, json),
        ContextSubcommand::List { project } => list(root, project.as_deref(), json),
    }
}

fn parse_id(id: &str) -> anyhow::Result<ContextId> {
    id.parse()
        .with_context(|| format!("invalid context id '{id}' (expected PREFIX_NNN)"))
}

fn create(root: &Path, project: &str, title: Option<&str>, json: bool) -> anyhow::Result<()> {
    let created = engine(root)
        .create(project, title)
        .with_context(|| format!("failed to create context in '{project}'"))?;

    if json {
        print_json(&created)?;
    } else {
        println!("Created context: {}", created.id);
        println!("Path: {}", created.path.display());
    }
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let details = engine(root)
        .show(&id)
        .with_context(|| format!("failed to show context {id}"))?;

    if json {
        print_json(&details)?;
    } else {
        println!("{}: {}", details.id, details.title);
        println!("Project: {}", details.project);
        println!("Path: {}", details.path.display());
        println!();
        print!("{}", details.body);
    }
    Ok(())
}

fn delete(root: &Path, id: &str, reorder: bool, force: bool, json: bool) -> anyhow::Result<()> {
    let id = parse_id(id)?;

    if !force {
        if json {
            anyhow::bail!("deleting with --json requires --force (no interactive prompt)");
        }
        let confirm = inquire::Confirm::new(&format!("Delete context {id}?"))
            .with_default(false)
            .prompt();
        if !matches!(confirm, Ok(true)) {
            println!("Cancelled");
            return Ok(());
        }
    }

    let summary = engine(root)
        .delete(&id, reorder)
        .with_context(|| format!("failed to delete context {id}"))?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Deleted context: {id}");
        if !reorder {
            println!("Skipped reorder (gaps will remain in numbering)");
        }
        print_summary(&summary);
    }
    Ok(())
}

fn move_context(root: &Path, id: &str, to: u32, json: bool) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let summary = engine(root)
        .move_to(&id, to)
        .with_context(|| format!("failed to move context {id} to position {to}"))?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Moved context {id} to position {to}");
        print_summary(&summary);
    }
    Ok(())
}

fn reorder(root: &Path, project: &str, json: bool) -> anyhow::Result<()> {
    let summary = engine(root)
        .reorder(project)
        .with_context(|| format!("failed to reorder project '{project}'"))?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Reordered project: {project}");
        print_summary(&summary);
    }
    Ok(())
}

fn list(root: &Path, project: Option<&str>, json: bool) -> anyhow::Result<()> {
    let eng = engine(root);
    let projects = match project {
        Some(p) => vec![p.to_string()],
        None => eng
            .list_projects()
            .context("failed to list projects")?
            .into_iter()
            .map(|p| p.name)
            .collect(),
    };

    let mut all = Vec::new();
    for p in &projects {
        let contexts = eng
            .list_contexts(p)
            .with_context(|| format!("failed to list contexts in '{p}'"))?;
        all.extend(contexts.into_iter().map(|c| (p.clone(), c)));
    }

    if json {
        let entries: Vec<_> = all
            .iter()
            .map(|(p, c)| {
                serde_json::json!({
                    "id": c.id.to_string(),
                    "project": p,
                    "title": c.title,
                    "path": c.path,
                })
            })
            .collect();
        print_json(&entries)?;
        return Ok(());
    }

    if all.is_empty() {
        println!("No contexts found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = all
        .iter()
        .map(|(p, c)| vec![c.id.to_string(), p.clone(), c.title.clone()])
        .collect();
    print_table(&["ID", "PROJECT", "TITLE"], rows);
    Ok(())
}
