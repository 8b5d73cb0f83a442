use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  "));
    }
}

/// Print a renumber summary the way an operator reads it: what moved,
/// then what to worry about.
pub fn print_summary(summary: &nexus_core::RenumberSummary) {
    if summary.remapped.is_empty() {
        println!("No contexts renumbered.");
    } else {
        println!("Renumbered {} context(s):", summary.remapped.len());
        for r in &summary.remapped {
            println!("  {} -> {}", r.from, r.to);
        }
    }
    if summary.edits > 0 || summary.renames > 0 {
        println!(
            "{} reference edit(s), {} file rename(s)",
            summary.edits, summary.renames
        );
    }
    for w in &summary.warnings {
        println!("warning: {w}");
    }
}
