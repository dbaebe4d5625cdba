//! Build-order resolution and toolchain invocation synthesis.
//!
//! Given a project's file dependency graph, this crate finds the root files
//! that hold runnable top-level designs, computes the ordered file set needed
//! for one requested top-level, and turns it into `iverilog` and `vvp`
//! command lines. Process execution is delegated to a [`ProcessRunner`]
//! supplied by the host.

#![warn(missing_docs)]

pub mod adapter;
pub mod capabilities;
pub mod error;
pub mod orchestrator;
pub mod resolve;
pub mod runner;
pub mod synth;
pub mod top_level;
pub mod version;

pub use adapter::DependencyGraph;
pub use capabilities::{Capabilities, Escalation};
pub use error::{BuildError, ErrorKind};
pub use orchestrator::{
    BatchEntry, BatchReport, Orchestrator, RunOutcome, RunReport, RunRequest, RunState, Toolchain,
};
pub use resolve::{resolve, resolve_build_order};
pub use runner::{ProcessOutput, ProcessRunner};
pub use synth::{
    plan_compile, synthesize_compile, synthesize_generics, synthesize_simulate, CompileInvocation,
    CompilePlan, FILE_LIST_NAME,
};
pub use top_level::TopLevelIndex;
pub use version::{check_version, parse_version, ParseVersionError, Version};

pub use ivy_config::{ClosureMode, WaveformFormat};
