use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use nexus_core::ContextEngine;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Register a new project
    Add {
        name: String,
        /// Uppercase ID prefix, e.g. NEX
        #[arg(long)]
        prefix: String,
    },
    /// List projects
    List,
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    let engine = ContextEngine::new(root);
    match subcmd {
        ProjectSubcommand::Add { name, prefix } => {
            engine
                .add_project(&name, &prefix)
                .with_context(|| format!("failed to add project '{name}'"))?;
            if json {
                println!(r#"{{"status": "added", "name": "{name}", "prefix": "{prefix}"}}"#);
            } else {
                println!("Added project: {name} ({prefix})");
                println!("Next: nexus context create {name}");
            }
            Ok(())
        }
        ProjectSubcommand::List => {
            let projects = engine.list_projects().context("failed to list projects")?;
            if json {
                print_json(&projects)?;
                return Ok(());
            }
            if projects.is_empty() {
                println!("No projects yet.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = projects
                .iter()
                .map(|p| vec![p.name.clone(), p.prefix.clone()])
                .collect();
            print_table(&["NAME", "PREFIX"], rows);
            Ok(())
        }
    }
}
