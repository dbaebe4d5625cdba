//! `ivy order`: print the compile order for one top-level.

use ivy_build::{resolve, DependencyGraph, TopLevelIndex};
use ivy_config::ClosureMode;
use ivy_project::SourceFile;

use crate::pipeline::{load_project, Project};
use crate::{GlobalArgs, OrderArgs, ReportFormat};

/// Runs the `ivy order` command.
pub fn run(args: &OrderArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let mode = if args.retain_non_top {
        ClosureMode::RetainNonTop
    } else {
        project.config.sim.closure
    };
    let files = build_order(&project, &args.top, mode)?;

    match args.format {
        ReportFormat::Text => {
            for file in &files {
                println!("{}", project.display_path(&file.path).display());
            }
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&files).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
    Ok(0)
}

fn build_order<'p>(
    project: &'p Project,
    top: &str,
    mode: ClosureMode,
) -> Result<Vec<&'p SourceFile>, Box<dyn std::error::Error>> {
    let graph = DependencyGraph::new(&project.graph)?;
    let index = TopLevelIndex::build(&graph)?;
    let order = resolve(&graph, &index, top, mode)?;
    Ok(order.into_iter().map(|id| graph.file(id)).collect())
}
