//! `ivy list`: print every top-level of the project.

use std::path::PathBuf;

use ivy_build::{DependencyGraph, TopLevelIndex};
use serde::Serialize;

use crate::pipeline::{load_project, Project};
use crate::{GlobalArgs, ListArgs, ReportFormat};

/// One top-level and where it is defined.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct TopLevelEntry {
    name: String,
    file: PathBuf,
    library: String,
}

/// Runs the `ivy list` command.
pub fn run(args: &ListArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let entries = top_levels(&project)?;

    match args.format {
        ReportFormat::Text => {
            if entries.is_empty() && !global.quiet {
                eprintln!("warning: no top-levels found");
            }
            let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
            for entry in &entries {
                println!("{:<width$}  {}", entry.name, entry.file.display());
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
    Ok(0)
}

fn top_levels(project: &Project) -> Result<Vec<TopLevelEntry>, Box<dyn std::error::Error>> {
    let graph = DependencyGraph::new(&project.graph)?;
    let index = TopLevelIndex::build(&graph)?;
    Ok(index
        .iter()
        .map(|(name, id)| {
            let file = graph.file(id);
            TopLevelEntry {
                name: name.to_string(),
                file: project.display_path(&file.path).to_path_buf(),
                library: file.library.clone(),
            }
        })
        .collect())
}
