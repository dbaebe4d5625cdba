//! Sequencing of one or more top-level runs against a project.
//!
//! A run walks a fixed chain of states:
//!
//! ```text
//! Init -> VersionChecked -> TopLevelResolved -> BuildOrderComputed
//!      -> CompileArgsReady -> Compiled -> Simulated | ElaborateOnlyDone
//! ```
//!
//! Any error ends the run in [`RunState::Failed`]. Nothing is retried.

use crate::adapter::DependencyGraph;
use crate::capabilities::Capabilities;
use crate::error::{BuildError, ErrorKind};
use crate::resolve::resolve;
use crate::runner::{ProcessOutput, ProcessRunner};
use crate::synth::{synthesize_compile, synthesize_generics, synthesize_simulate};
use crate::top_level::TopLevelIndex;
use crate::version::{check_version, Version};
use ivy_config::{ClosureMode, ResolvedRun, WaveformFormat};
use ivy_project::{FileId, FileSet, ProjectGraph, SourceFile};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Program paths for the compiler and runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Compiler program.
    pub compiler: String,
    /// Runtime program.
    pub runtime: String,
}

impl Toolchain {
    /// The toolchain's programs inside `prefix`, or bare names resolved
    /// through `PATH` when there is no prefix.
    pub fn new(prefix: Option<&Path>, caps: &Capabilities) -> Self {
        let program = |name: &str| match prefix {
            Some(dir) => dir.join(name).to_string_lossy().into_owned(),
            None => name.to_string(),
        };
        Self {
            compiler: program(&caps.compiler),
            runtime: program(&caps.runtime),
        }
    }
}

/// One requested top-level run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Top-level design unit name.
    pub top: String,
    /// Parameter overrides applied to the top-level.
    pub generics: BTreeMap<String, String>,
    /// Extra runtime flags, in order.
    pub sim_flags: Vec<String>,
    /// Waveform format requested from the runtime.
    pub waveform: WaveformFormat,
    /// Stop after compiling.
    pub elaborate_only: bool,
    /// How the compile set is chosen.
    pub closure: ClosureMode,
}

impl RunRequest {
    /// A request for `top` with default settings.
    pub fn new(top: impl Into<String>) -> Self {
        Self {
            top: top.into(),
            generics: BTreeMap::new(),
            sim_flags: Vec::new(),
            waveform: WaveformFormat::default(),
            elaborate_only: false,
            closure: ClosureMode::default(),
        }
    }

    /// A request for `top` using merged configuration settings.
    pub fn from_settings(top: impl Into<String>, settings: &ResolvedRun) -> Self {
        Self {
            top: top.into(),
            generics: settings.generics.clone(),
            sim_flags: settings.vvp_flags.clone(),
            waveform: settings.waveform,
            elaborate_only: settings.elaborate_only,
            closure: settings.closure,
        }
    }
}

/// A state of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing done yet.
    Init,
    /// The toolchain version is supported.
    VersionChecked,
    /// The requested name maps to a root file.
    TopLevelResolved,
    /// The ordered compile set is known.
    BuildOrderComputed,
    /// The file list is written and the compile command built.
    CompileArgsReady,
    /// The compiler succeeded.
    Compiled,
    /// The simulation ran and succeeded.
    Simulated,
    /// Compilation succeeded and simulation was not requested.
    ElaborateOnlyDone,
    /// The run stopped with an error of this kind.
    Failed(ErrorKind),
}

/// Artifacts and outputs of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The top-level that ran.
    pub top: String,
    /// Compiled files, in order.
    pub files: Vec<PathBuf>,
    /// Directory holding the file list and binary.
    pub output_dir: PathBuf,
    /// The compiled binary.
    pub binary: PathBuf,
    /// The complete compiler command line.
    pub compile_args: Vec<String>,
    /// Compiler output.
    pub compile_output: ProcessOutput,
    /// The runtime command line, unless elaborate-only.
    pub simulate_args: Option<Vec<String>>,
    /// Runtime output, unless elaborate-only.
    pub simulate_output: Option<ProcessOutput>,
}

/// The states a run passed through and how it ended.
#[derive(Debug)]
pub struct RunReport {
    /// Every state reached, starting with [`RunState::Init`].
    pub states: Vec<RunState>,
    /// The run's result.
    pub result: Result<RunOutcome, BuildError>,
}

impl RunReport {
    /// The last state reached.
    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Init)
    }
}

/// Result of one request within a batch.
#[derive(Debug)]
pub enum BatchEntry {
    /// The run succeeded.
    Passed(RunOutcome),
    /// The run failed.
    Failed(BuildError),
    /// The run was not attempted because a file it needs already failed.
    Skipped {
        /// The failed file.
        blocked_by: PathBuf,
    },
}

/// Per-request results of a batch, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(top-level, result)` pairs.
    pub entries: Vec<(String, BatchEntry)>,
}

impl BatchReport {
    /// Number of passed requests.
    pub fn passed(&self) -> usize {
        self.count(|e| matches!(e, BatchEntry::Passed(_)))
    }

    /// Number of failed requests.
    pub fn failed(&self) -> usize {
        self.count(|e| matches!(e, BatchEntry::Failed(_)))
    }

    /// Number of skipped requests.
    pub fn skipped(&self) -> usize {
        self.count(|e| matches!(e, BatchEntry::Skipped { .. }))
    }

    /// Returns true if every request passed.
    pub fn is_success(&self) -> bool {
        self.passed() == self.entries.len()
    }

    fn count(&self, pred: impl Fn(&BatchEntry) -> bool) -> usize {
        self.entries.iter().filter(|(_, e)| pred(e)).count()
    }
}

/// Drives runs of a project's top-levels through a toolchain.
///
/// The dependency graph and top-level index are built once in
/// [`Orchestrator::new`]; the toolchain version is queried at most once per
/// orchestrator.
pub struct Orchestrator<'g, R> {
    graph: DependencyGraph<'g>,
    index: TopLevelIndex,
    caps: Capabilities,
    toolchain: Toolchain,
    runner: R,
    output_root: PathBuf,
    library_files: Vec<PathBuf>,
    version: OnceCell<Version>,
}

impl<'g, R: ProcessRunner> Orchestrator<'g, R> {
    /// Prepares runs over `project`, writing artifacts below `output_root`.
    ///
    /// Fails if the project graph has a cycle or two root files define the
    /// same unit.
    pub fn new(
        project: &'g dyn ProjectGraph,
        caps: Capabilities,
        toolchain: Toolchain,
        runner: R,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self, BuildError> {
        let graph = DependencyGraph::new(project)?;
        let index = TopLevelIndex::build(&graph)?;
        debug!(top_levels = index.len(), files = graph.files().len(), "indexed project");
        Ok(Self {
            graph,
            index,
            caps,
            toolchain,
            runner,
            output_root: output_root.into(),
            library_files: Vec::new(),
            version: OnceCell::new(),
        })
    }

    /// Sets the library files passed to every compile.
    pub fn with_library_files(mut self, files: Vec<PathBuf>) -> Self {
        self.library_files = files;
        self
    }

    /// The project's top-levels.
    pub fn index(&self) -> &TopLevelIndex {
        &self.index
    }

    /// The files compiled for `top`, in order.
    pub fn build_order(&self, top: &str, mode: ClosureMode) -> Result<Vec<&'g SourceFile>, BuildError> {
        let order = resolve(&self.graph, &self.index, top, mode)?;
        Ok(order.into_iter().map(|id| self.graph.file(id)).collect())
    }

    /// Queries the compiler version and checks it against the minimum.
    ///
    /// A supported version is remembered; later calls do not run the
    /// compiler again.
    pub fn check_toolchain(&self) -> Result<Version, BuildError> {
        if let Some(version) = self.version.get() {
            return Ok(*version);
        }
        let args = [self.toolchain.compiler.clone(), self.caps.version_flag.clone()];
        let raw = self
            .runner
            .capture(&args)
            .map_err(|source| BuildError::Process {
                program: self.toolchain.compiler.clone(),
                source,
            })?;
        let version = check_version(&self.caps.name, &raw, self.caps.min_version)?;
        Ok(*self.version.get_or_init(|| version))
    }

    /// Runs one request.
    pub fn run(&self, request: &RunRequest) -> Result<RunOutcome, BuildError> {
        self.run_traced(request).result
    }

    /// Runs one request, recording every state it reaches.
    pub fn run_traced(&self, request: &RunRequest) -> RunReport {
        let mut states = vec![RunState::Init];
        let result = self.execute(request, &mut states);
        if let Err(ref err) = result {
            states.push(RunState::Failed(err.kind()));
        }
        RunReport { states, result }
    }

    fn execute(
        &self,
        request: &RunRequest,
        states: &mut Vec<RunState>,
    ) -> Result<RunOutcome, BuildError> {
        self.check_toolchain()?;
        states.push(RunState::VersionChecked);

        self.index.lookup(&request.top)?;
        states.push(RunState::TopLevelResolved);

        let order = resolve(&self.graph, &self.index, &request.top, request.closure)?;
        let files: Vec<&SourceFile> = order.iter().map(|&id| self.graph.file(id)).collect();
        states.push(RunState::BuildOrderComputed);

        let output_dir = self.output_root.join(&request.top);
        ensure_dir(&self.output_root)?;
        ensure_dir(&output_dir)?;
        let invocation = synthesize_compile(
            &files,
            &self.library_files,
            &output_dir,
            &self.toolchain.compiler,
            &self.caps,
        )?;
        let params = synthesize_generics(&request.generics, &request.top, &self.caps);
        let compile_args = invocation.command(&params);
        states.push(RunState::CompileArgsReady);

        info!(top = %request.top, files = files.len(), "compiling");
        let compile_output = self
            .runner
            .run(&compile_args, &output_dir)
            .map_err(|source| BuildError::Process {
                program: self.toolchain.compiler.clone(),
                source,
            })?;
        if !compile_output.success() {
            error!(top = %request.top, status = ?compile_output.status, "failed to compile sources");
            return Err(BuildError::CompileFailed {
                top: request.top.clone(),
                status: compile_output.status,
                stderr: compile_output.stderr,
            });
        }
        states.push(RunState::Compiled);

        let mut outcome = RunOutcome {
            top: request.top.clone(),
            files: files.iter().map(|f| f.path.clone()).collect(),
            output_dir,
            binary: invocation.binary,
            compile_args,
            compile_output,
            simulate_args: None,
            simulate_output: None,
        };
        if request.elaborate_only {
            states.push(RunState::ElaborateOnlyDone);
            return Ok(outcome);
        }

        let sim_args = synthesize_simulate(
            &self.toolchain.runtime,
            &outcome.binary,
            request.waveform,
            &request.sim_flags,
            &self.caps,
        );
        info!(top = %request.top, "simulating");
        let sim_output = self
            .runner
            .run(&sim_args, &outcome.output_dir)
            .map_err(|e| {
                error!(top = %request.top, error = %e, "failed to run simulation");
                BuildError::SimulateFailed {
                    top: request.top.clone(),
                    reason: e.to_string(),
                    stdout: String::new(),
                    stderr: String::new(),
                }
            })?;
        if !sim_output.success() {
            error!(top = %request.top, status = ?sim_output.status, "simulation failed");
            return Err(BuildError::SimulateFailed {
                top: request.top.clone(),
                reason: match sim_output.status {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                },
                stdout: sim_output.stdout,
                stderr: sim_output.stderr,
            });
        }
        states.push(RunState::Simulated);
        outcome.simulate_args = Some(sim_args);
        outcome.simulate_output = Some(sim_output);
        Ok(outcome)
    }

    /// Runs every request in order.
    ///
    /// The toolchain version is checked once up front. A file rejected as
    /// unsupported is remembered, and later requests whose compile set
    /// contains it are skipped. Version and cycle errors end the whole batch
    /// with `Err`; every other error only fails its own request.
    pub fn run_batch(&self, requests: &[RunRequest]) -> Result<BatchReport, BuildError> {
        self.check_toolchain()?;
        let mut failed_files = FileSet::new();
        let mut report = BatchReport::default();

        for request in requests {
            let entry = match self.blocker(request, &failed_files) {
                Ok(Some(blocked)) => {
                    let blocked_by = self.graph.file(blocked).path.clone();
                    info!(top = %request.top, blocked_by = %blocked_by.display(), "skipping");
                    BatchEntry::Skipped { blocked_by }
                }
                Ok(None) => match self.run(request) {
                    Ok(outcome) => BatchEntry::Passed(outcome),
                    Err(err) if err.aborts_batch() => return Err(err),
                    Err(err) => {
                        if let BuildError::UnsupportedFileType { ref path, .. } = err {
                            failed_files.extend(self.file_id(path));
                        }
                        BatchEntry::Failed(err)
                    }
                },
                Err(err) => BatchEntry::Failed(err),
            };
            report.entries.push((request.top.clone(), entry));
        }
        Ok(report)
    }

    /// The first failed file in `request`'s compile set, if any.
    fn blocker(
        &self,
        request: &RunRequest,
        failed: &FileSet,
    ) -> Result<Option<FileId>, BuildError> {
        if failed.is_empty() {
            return Ok(None);
        }
        let order = resolve(&self.graph, &self.index, &request.top, request.closure)?;
        Ok(order.into_iter().find(|id| failed.contains(id)))
    }

    fn file_id(&self, path: &Path) -> Option<FileId> {
        self.graph
            .files()
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.id)
    }
}

fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if path.exists() && !path.is_dir() {
        return Err(BuildError::OutputDirectory {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    std::fs::create_dir_all(path).map_err(|e| BuildError::OutputDirectory {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::FILE_LIST_NAME;
    use ivy_project::FileGraph;
    use std::cell::RefCell;
    use std::io;
    use tempfile::TempDir;

    /// Records every command and answers with canned results.
    struct FakeRunner {
        banner: String,
        compile_status: i32,
        sim_status: Option<i32>,
        sim_stdout: String,
        calls: RefCell<Vec<(Vec<String>, PathBuf)>>,
    }

    impl FakeRunner {
        fn new() -> Self {
            Self {
                banner: "Icarus Verilog version 11.0 (stable) ()".to_string(),
                compile_status: 0,
                sim_status: Some(0),
                sim_stdout: String::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(args, _)| args[0].clone())
                .collect()
        }

        fn call(&self, i: usize) -> Vec<String> {
            self.calls.borrow()[i].0.clone()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, args: &[String], cwd: &Path) -> io::Result<ProcessOutput> {
            self.calls
                .borrow_mut()
                .push((args.to_vec(), cwd.to_path_buf()));
            let status = match (args[0].as_str(), args.get(1).map(String::as_str)) {
                (_, Some("-V")) => {
                    return Ok(ProcessOutput {
                        status: Some(0),
                        stdout: self.banner.clone(),
                        stderr: String::new(),
                    })
                }
                ("iverilog", _) => Some(self.compile_status),
                ("vvp", _) => match self.sim_status {
                    Some(code) => Some(code),
                    None => return Err(io::Error::new(io::ErrorKind::NotFound, "vvp not found")),
                },
                _ => Some(127),
            };
            let stdout = if args[0] == "vvp" {
                self.sim_stdout.clone()
            } else {
                String::new()
            };
            Ok(ProcessOutput {
                status,
                stdout,
                stderr: if status == Some(0) {
                    String::new()
                } else {
                    "syntax error".to_string()
                },
            })
        }
    }

    fn file(i: u32, name: &str) -> SourceFile {
        let stem = name.split('.').next().unwrap_or(name);
        SourceFile::new(FileId::from_raw(i), format!("/p/{name}"), "lib").with_units([stem])
    }

    fn id(i: u32) -> FileId {
        FileId::from_raw(i)
    }

    /// adder_tb -> adder -> full_add, subtract_tb -> subtract
    fn adder_project() -> FileGraph {
        FileGraph::from_edges(
            vec![
                file(0, "adder.v").with_define("DEBUG", "1"),
                file(1, "full_add.v"),
                file(2, "subtract.v"),
                file(3, "adder_tb.sv"),
                file(4, "subtract_tb.sv"),
            ],
            [(id(0), id(1)), (id(3), id(0)), (id(4), id(2))],
        )
    }

    fn orchestrator<'g>(
        graph: &'g FileGraph,
        runner: &'g FakeRunner,
        out: &Path,
    ) -> Orchestrator<'g, &'g FakeRunner> {
        Orchestrator::new(
            graph,
            Capabilities::icarus(),
            Toolchain::new(None, &Capabilities::icarus()),
            runner,
            out,
        )
        .unwrap()
    }

    #[test]
    fn full_run_walks_every_state() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let mut request = RunRequest::new("adder_tb");
        request.generics.insert("D_WIDTH".to_string(), "10".to_string());
        request.sim_flags.push("-v".to_string());
        let report = orch.run_traced(&request);

        assert_eq!(
            report.states,
            vec![
                RunState::Init,
                RunState::VersionChecked,
                RunState::TopLevelResolved,
                RunState::BuildOrderComputed,
                RunState::CompileArgsReady,
                RunState::Compiled,
                RunState::Simulated,
            ]
        );
        let outcome = report.result.unwrap();
        let out_dir = tmp.path().join("adder_tb");
        assert_eq!(outcome.output_dir, out_dir);
        assert_eq!(
            outcome.files,
            vec![
                PathBuf::from("/p/full_add.v"),
                PathBuf::from("/p/adder.v"),
                PathBuf::from("/p/adder_tb.sv"),
            ]
        );
        assert_eq!(
            std::fs::read_to_string(out_dir.join(FILE_LIST_NAME)).unwrap(),
            "/p/full_add.v\n/p/adder.v\n/p/adder_tb.sv\n"
        );

        assert_eq!(runner.programs(), vec!["iverilog", "iverilog", "vvp"]);
        let compile = runner.call(1);
        assert!(compile.contains(&"-g2012".to_string()));
        assert!(compile.contains(&"-DDEBUG=1".to_string()));
        assert_eq!(compile[compile.len() - 2..], ["-P", "adder_tb.D_WIDTH=10"]);
        assert_eq!(runner.calls.borrow()[1].1, out_dir);

        let binary = out_dir.join("icarus").to_string_lossy().into_owned();
        assert_eq!(runner.call(2), vec!["vvp", "-n", "-lxt2", "-v", binary.as_str()]);
        assert_eq!(outcome.simulate_args, Some(runner.call(2)));
    }

    #[test]
    fn elaborate_only_skips_simulation() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let mut request = RunRequest::new("subtract_tb");
        request.elaborate_only = true;
        let report = orch.run_traced(&request);

        assert_eq!(report.final_state(), RunState::ElaborateOnlyDone);
        assert!(!report.states.contains(&RunState::Simulated));
        let outcome = report.result.unwrap();
        assert!(outcome.simulate_args.is_none());
        assert_eq!(runner.programs(), vec!["iverilog", "iverilog"]);
    }

    #[test]
    fn old_toolchain_stops_before_compiling() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.banner = "Icarus Verilog version 10.1 (stable)".to_string();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let report = orch.run_traced(&RunRequest::new("adder_tb"));
        assert_eq!(
            report.states,
            vec![
                RunState::Init,
                RunState::Failed(ErrorKind::ToolchainVersion)
            ]
        );
        assert_eq!(runner.programs(), vec!["iverilog"]);
    }

    #[test]
    fn unknown_top_level_fails_after_version() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let report = orch.run_traced(&RunRequest::new("adder"));
        assert_eq!(
            report.states,
            vec![
                RunState::Init,
                RunState::VersionChecked,
                RunState::Failed(ErrorKind::UnknownTopLevel)
            ]
        );
        match report.result {
            Err(BuildError::UnknownTopLevel { known, .. }) => {
                assert_eq!(known, vec!["adder_tb", "subtract_tb"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn compile_failure_carries_stderr() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.compile_status = 1;
        let orch = orchestrator(&graph, &runner, tmp.path());

        let report = orch.run_traced(&RunRequest::new("adder_tb"));
        assert_eq!(
            report.final_state(),
            RunState::Failed(ErrorKind::CompileFailed)
        );
        match report.result {
            Err(BuildError::CompileFailed { status, stderr, .. }) => {
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "syntax error");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!runner.programs().contains(&"vvp".to_string()));
    }

    #[test]
    fn simulation_launch_failure() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.sim_status = None;
        let orch = orchestrator(&graph, &runner, tmp.path());

        let err = orch.run(&RunRequest::new("adder_tb")).unwrap_err();
        assert!(matches!(err, BuildError::SimulateFailed { ref reason, .. } if reason.contains("vvp not found")));
    }

    #[test]
    fn simulation_exit_status_failure() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.sim_status = Some(3);
        let orch = orchestrator(&graph, &runner, tmp.path());

        let report = orch.run_traced(&RunRequest::new("adder_tb"));
        assert_eq!(
            report.final_state(),
            RunState::Failed(ErrorKind::SimulateFailed)
        );
        assert!(report.states.contains(&RunState::Compiled));
    }

    #[test]
    fn simulation_failure_keeps_simulator_output() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.sim_status = Some(1);
        runner.sim_stdout = "ERROR: adder_tb.sv:12: sum mismatch\n".to_string();
        let orch = orchestrator(&graph, &runner, tmp.path());

        match orch.run(&RunRequest::new("adder_tb")) {
            Err(BuildError::SimulateFailed {
                reason,
                stdout,
                stderr,
                ..
            }) => {
                assert_eq!(reason, "exit status 1");
                assert!(stdout.contains("sum mismatch"));
                assert_eq!(stderr, "syntax error");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn output_path_that_is_a_file_errors() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("out");
        std::fs::write(&blocker, "not a dir").unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, &blocker);

        let err = orch.run(&RunRequest::new("adder_tb")).unwrap_err();
        assert!(matches!(err, BuildError::OutputDirectory { ref path, .. } if path == &blocker));
    }

    #[test]
    fn version_is_queried_once() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        orch.run(&RunRequest::new("adder_tb")).unwrap();
        orch.run(&RunRequest::new("subtract_tb")).unwrap();
        let version_calls = runner
            .calls
            .borrow()
            .iter()
            .filter(|(args, _)| args.get(1).map(String::as_str) == Some("-V"))
            .count();
        assert_eq!(version_calls, 1);
    }

    #[test]
    fn retain_non_top_compiles_unrelated_helpers() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let mut request = RunRequest::new("adder_tb");
        request.closure = ClosureMode::RetainNonTop;
        request.elaborate_only = true;
        let outcome = orch.run(&request).unwrap();
        assert!(outcome.files.contains(&PathBuf::from("/p/subtract.v")));
        assert!(!outcome.files.contains(&PathBuf::from("/p/subtract_tb.sv")));
    }

    /// a_tb and b_tb share an unsupported file; c_tb does not.
    fn mixed_project() -> FileGraph {
        FileGraph::from_edges(
            vec![
                file(0, "a_tb.sv"),
                file(1, "b_tb.sv"),
                file(2, "c_tb.sv"),
                file(3, "bad.vhd"),
                file(4, "good.v"),
            ],
            [(id(0), id(3)), (id(1), id(3)), (id(2), id(4))],
        )
    }

    #[test]
    fn batch_skips_requests_blocked_by_failed_file() {
        let tmp = TempDir::new().unwrap();
        let graph = mixed_project();
        let runner = FakeRunner::new();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let requests: Vec<RunRequest> = ["a_tb", "b_tb", "c_tb", "nope"]
            .into_iter()
            .map(RunRequest::new)
            .collect();
        let report = orch.run_batch(&requests).unwrap();

        assert!(matches!(
            report.entries[0].1,
            BatchEntry::Failed(BuildError::UnsupportedFileType { .. })
        ));
        match &report.entries[1].1 {
            BatchEntry::Skipped { blocked_by } => {
                assert_eq!(blocked_by, &PathBuf::from("/p/bad.vhd"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
        assert!(matches!(report.entries[2].1, BatchEntry::Passed(_)));
        assert!(matches!(
            report.entries[3].1,
            BatchEntry::Failed(BuildError::UnknownTopLevel { .. })
        ));
        assert_eq!(
            (report.passed(), report.failed(), report.skipped()),
            (1, 2, 1)
        );
        assert!(!report.is_success());
    }

    #[test]
    fn batch_aborts_on_old_toolchain() {
        let tmp = TempDir::new().unwrap();
        let graph = adder_project();
        let mut runner = FakeRunner::new();
        runner.banner = "no version here".to_string();
        let orch = orchestrator(&graph, &runner, tmp.path());

        let err = orch
            .run_batch(&[RunRequest::new("adder_tb")])
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolchainVersion { .. }));
        assert_eq!(runner.programs().len(), 1);
    }

    #[test]
    fn duplicate_roots_fail_construction() {
        let graph = FileGraph::from_edges(
            vec![
                SourceFile::new(id(0), "/p/one.sv", "lib").with_units(["tb"]),
                SourceFile::new(id(1), "/p/two.sv", "lib").with_units(["tb"]),
            ],
            [],
        );
        let runner = FakeRunner::new();
        let caps = Capabilities::icarus();
        let result = Orchestrator::new(
            &graph,
            caps.clone(),
            Toolchain::new(None, &caps),
            &runner,
            "/tmp/unused",
        );
        assert!(matches!(result, Err(BuildError::DuplicateTopLevel { .. })));
    }

    #[test]
    fn toolchain_prefix_joins_program_names() {
        let caps = Capabilities::icarus();
        let tc = Toolchain::new(Some(Path::new("/opt/iverilog/bin")), &caps);
        assert_eq!(tc.compiler, "/opt/iverilog/bin/iverilog");
        assert_eq!(tc.runtime, "/opt/iverilog/bin/vvp");
    }

    #[test]
    fn request_from_settings() {
        let settings = ResolvedRun {
            generics: BTreeMap::from([("W".to_string(), "4".to_string())]),
            vvp_flags: vec!["-v".to_string()],
            waveform: WaveformFormat::Vcd,
            elaborate_only: true,
            closure: ClosureMode::RetainNonTop,
        };
        let request = RunRequest::from_settings("tb", &settings);
        assert_eq!(request.top, "tb");
        assert_eq!(request.generics["W"], "4");
        assert_eq!(request.sim_flags, vec!["-v"]);
        assert_eq!(request.waveform, WaveformFormat::Vcd);
        assert!(request.elaborate_only);
        assert_eq!(request.closure, ClosureMode::RetainNonTop);
    }
}
