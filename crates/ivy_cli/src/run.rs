//! `ivy run`: compile and simulate top-levels.
//!
//! Loads the project, merges command-line overrides into the configured
//! settings, then runs every requested top-level as one batch. Reports
//! per-top-level status and a summary line.

use ivy_build::{
    BatchEntry, BatchReport, BuildError, Capabilities, Orchestrator, RunOutcome, RunRequest,
};
use ivy_config::{resolve_run_settings, RunOverrides};

use crate::pipeline::{capabilities, load_project, locate_toolchain, SystemRunner};
use crate::{GlobalArgs, RunArgs};

/// Runs the `ivy run` command.
///
/// Returns exit code 0 if every top-level passed, 1 otherwise.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let overrides = RunOverrides {
        generics: args.generics.clone(),
        vvp_flags: args.vvp_flags.clone(),
        elaborate_only: args.elaborate_only,
        retain_non_top: args.retain_non_top,
    };
    let settings = resolve_run_settings(&project.config, &overrides);
    let caps = capabilities(&project.config)?;
    check_gui(args.gui, &caps)?;
    let toolchain = locate_toolchain(project.config.toolchain.prefix.as_deref(), &caps);

    let orchestrator = Orchestrator::new(
        &project.graph,
        caps,
        toolchain,
        SystemRunner,
        project.output_dir(),
    )?
    .with_library_files(project.library_files());

    let tops = if args.tops.is_empty() {
        orchestrator.index().names()
    } else {
        args.tops.clone()
    };
    if tops.is_empty() {
        if !global.quiet {
            eprintln!("warning: no top-levels found in {}", project.config.project.name);
        }
        return Ok(0);
    }

    if !global.quiet {
        eprintln!(
            "   Running {} top-level(s) of {}",
            tops.len(),
            project.config.project.name
        );
    }

    let requests: Vec<RunRequest> = tops
        .iter()
        .map(|top| RunRequest::from_settings(top.as_str(), &settings))
        .collect();
    let report = orchestrator.run_batch(&requests)?;

    if !global.quiet {
        for (top, entry) in &report.entries {
            print_entry(top, entry, global.verbose);
        }
        eprintln!();
        eprintln!("   Result: {}", summary(&report));
    }

    Ok(if report.is_success() { 0 } else { 1 })
}

fn check_gui(requested: bool, caps: &Capabilities) -> Result<(), String> {
    if requested && !caps.supports_gui {
        return Err(format!("{} does not support --gui", caps.name));
    }
    Ok(())
}

fn summary(report: &BatchReport) -> String {
    format!(
        "{} passed, {} failed, {} skipped out of {} top-level(s)",
        report.passed(),
        report.failed(),
        report.skipped(),
        report.entries.len()
    )
}

fn print_entry(top: &str, entry: &BatchEntry, verbose: bool) {
    match entry {
        BatchEntry::Passed(outcome) => {
            print_sim_output(outcome);
            let mode = if outcome.simulate_args.is_some() {
                "simulated"
            } else {
                "elaborated"
            };
            eprintln!("   PASS  {top} ({mode}, {} file(s))", outcome.files.len());
            if verbose {
                eprintln!("         {}", outcome.compile_args.join(" "));
            }
        }
        BatchEntry::Failed(err) => {
            if let BuildError::SimulateFailed { stdout, .. } = err {
                print!("{stdout}");
            }
            eprintln!("   FAIL  {top}: {err}");
            if let Some(stderr) = failure_stderr(err) {
                print_indented(stderr);
            }
        }
        BatchEntry::Skipped { blocked_by } => {
            eprintln!("   SKIP  {top}: depends on failed {}", blocked_by.display());
        }
    }
}

/// Toolchain diagnostics carried by a failed compile or simulation.
fn failure_stderr(err: &BuildError) -> Option<&str> {
    match err {
        BuildError::CompileFailed { stderr, .. } | BuildError::SimulateFailed { stderr, .. } => {
            Some(stderr.as_str())
        }
        _ => None,
    }
}

fn print_indented(text: &str) {
    for line in text.lines() {
        eprintln!("         {line}");
    }
}

fn print_sim_output(outcome: &RunOutcome) {
    if let Some(ref output) = outcome.simulate_output {
        print!("{}", output.stdout);
    }
}
