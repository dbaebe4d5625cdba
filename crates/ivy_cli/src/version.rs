//! `ivy version`: report the installed toolchain version.

use std::path::Path;

use ivy_build::{parse_version, Capabilities, ProcessRunner, Toolchain, Version};
use tracing::debug;

use crate::pipeline::{
    capabilities, find_project_root, load_project, locate_toolchain, Project, SystemRunner,
};
use crate::GlobalArgs;

/// Runs the `ivy version` command.
///
/// Works outside a project too, using the default minimum version and
/// searching `PATH`. A project that exists but fails to load is an error.
/// Returns exit code 1 when the toolchain is too old.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (caps, toolchain) = match find_project(global, &std::env::current_dir()?)? {
        Some(project) => {
            let caps = capabilities(&project.config)?;
            let toolchain = locate_toolchain(project.config.toolchain.prefix.as_deref(), &caps);
            (caps, toolchain)
        }
        None => {
            debug!("no project, using toolchain defaults");
            let caps = Capabilities::icarus();
            let toolchain = locate_toolchain(None, &caps);
            (caps, toolchain)
        }
    };

    let detected = query_version(&SystemRunner, &toolchain, &caps)?;
    let supported = detected.is_supported(caps.min_version);
    println!("{} {detected} ({})", caps.name, toolchain.compiler);
    if !global.quiet {
        eprintln!("   {}", status_line(detected, caps.min_version));
    }
    Ok(if supported { 0 } else { 1 })
}

/// Loads the project named by `--config`, or the one enclosing `cwd`.
/// Returns `None` only when there is no `--config` and no enclosing project.
fn find_project(
    global: &GlobalArgs,
    cwd: &Path,
) -> Result<Option<Project>, Box<dyn std::error::Error>> {
    if global.config.is_some() {
        return load_project(global).map(Some);
    }
    let Ok(root) = find_project_root(cwd) else {
        return Ok(None);
    };
    let at_root = GlobalArgs {
        quiet: global.quiet,
        verbose: global.verbose,
        config: Some(root.to_string_lossy().into_owned()),
    };
    load_project(&at_root).map(Some)
}

fn query_version(
    runner: &dyn ProcessRunner,
    toolchain: &Toolchain,
    caps: &Capabilities,
) -> Result<Version, Box<dyn std::error::Error>> {
    let raw = runner
        .capture(&[toolchain.compiler.clone(), caps.version_flag.clone()])
        .map_err(|e| format!("failed to launch {}: {e}", toolchain.compiler))?;
    Ok(parse_version(&raw))
}

fn status_line(detected: Version, minimum: Version) -> String {
    if detected.is_supported(minimum) {
        format!("supported (minimum {minimum})")
    } else {
        format!("not supported, minimum is {minimum}")
    }
}
