//! Shared pipeline helpers for CLI commands.
//!
//! Project root resolution, project loading, toolchain location, and the
//! process runner that executes toolchain programs on this machine.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use ivy_build::{Capabilities, ProcessOutput, ProcessRunner, Toolchain, Version};
use ivy_config::{ProjectConfig, CONFIG_FILE_NAME};
use ivy_project::{discover_sources, FileGraph};
use tracing::debug;

use crate::GlobalArgs;

/// A loaded project: its root directory, configuration and file graph.
pub struct Project {
    /// Directory containing `ivy.toml`.
    pub dir: PathBuf,
    /// Parsed configuration.
    pub config: ProjectConfig,
    /// Dependency graph over every discovered source file.
    pub graph: FileGraph,
}

impl Project {
    /// Directory receiving build artifacts.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(&self.config.project.output_dir)
    }

    /// Library files handed to the compiler, made absolute.
    pub fn library_files(&self) -> Vec<PathBuf> {
        self.config
            .toolchain
            .library_files
            .iter()
            .map(|f| self.dir.join(f))
            .collect()
    }

    /// `path` relative to the project root when it lies inside it.
    pub fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.dir).unwrap_or(path)
    }
}

/// Walks up from `start` looking for the nearest directory containing `ivy.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the configuration and builds the file graph.
///
/// With `--config <file>` that file is read and its directory is the project
/// root; `--config <dir>` names the root directly. Otherwise the root is
/// found by walking up from the current directory.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let (dir, config) = match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let dir = config_file_dir(&p);
                let content = std::fs::read_to_string(&p)?;
                (dir, ivy_config::load_config_from_str(&content)?)
            } else {
                let config = ivy_config::load_config(&p)?;
                (p, config)
            }
        }
        None => {
            let dir = find_project_root(&std::env::current_dir()?)?;
            let config = ivy_config::load_config(&dir)?;
            (dir, config)
        }
    };
    let dir = std::fs::canonicalize(&dir)?;

    let files = discover_sources(&config, &dir)?;
    let graph = FileGraph::from_units(files);
    debug!(
        project = %config.project.name,
        files = ivy_project::ProjectGraph::source_files(&graph).len(),
        edges = graph.edge_count(),
        "loaded project"
    );
    Ok(Project { dir, config, graph })
}

/// Directory holding `config_file`. A bare file name lives in `.`.
fn config_file_dir(config_file: &Path) -> PathBuf {
    config_file
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Icarus capabilities with the configured minimum version applied.
pub fn capabilities(config: &ProjectConfig) -> Result<Capabilities, Box<dyn std::error::Error>> {
    let caps = Capabilities::icarus();
    match config.toolchain.min_version {
        Some(ref raw) => Ok(caps.with_min_version(raw.parse::<Version>()?)),
        None => Ok(caps),
    }
}

/// Locates the compiler and runtime.
///
/// Uses `prefix` (from `[toolchain] prefix`) when set, else the first `PATH`
/// entry holding the compiler. Falls back to bare program names.
pub fn locate_toolchain(prefix: Option<&str>, caps: &Capabilities) -> Toolchain {
    if let Some(prefix) = prefix {
        return Toolchain::new(Some(Path::new(prefix)), caps);
    }
    let found = std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths).find(|dir| dir.join(&caps.compiler).is_file())
    });
    debug!(prefix = ?found, compiler = %caps.compiler, "searched PATH for toolchain");
    Toolchain::new(found.as_deref(), caps)
}

/// Runs programs with [`std::process::Command`], capturing their output.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, args: &[String], cwd: &Path) -> io::Result<ProcessOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;
        debug!(command = %args.join(" "), cwd = %cwd.display(), "running");
        let output = Command::new(program).args(rest).current_dir(cwd).output()?;
        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
