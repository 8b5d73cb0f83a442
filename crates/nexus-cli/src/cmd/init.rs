use anyhow::Context;
use nexus_core::ContextEngine;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let engine = ContextEngine::new(root);
    engine.init().context("failed to initialize corpus")?;
    println!("Initialized context corpus at {}", root.join(".context").display());
    println!("Next: nexus project add <name> --prefix <PREFIX>");
    Ok(())
}
