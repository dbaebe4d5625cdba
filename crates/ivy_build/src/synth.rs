//! Compiler and runtime command lines for a resolved file set.
//!
//! Everything here is a pure function of its inputs except
//! [`synthesize_compile`], which also writes the compiler's file list.

use crate::capabilities::Capabilities;
use crate::error::BuildError;
use ivy_config::WaveformFormat;
use ivy_project::SourceFile;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the compiler's file list inside the output directory.
pub const FILE_LIST_NAME: &str = "ivy.cf";

/// Flags gathered from a resolved file sequence.
///
/// Include directories and defines are per file in the project model but
/// global to one compiler invocation, so they are merged here: an include
/// directory appears once, and the first value seen for a define wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilePlan {
    /// Files in compile order.
    pub files: Vec<PathBuf>,
    /// `-I` flags in first-seen order.
    pub include_flags: Vec<String>,
    /// `-D` flags in first-seen order.
    pub define_flags: Vec<String>,
    /// Whether the escalation flag is needed.
    pub escalate: bool,
    seen_includes: BTreeSet<PathBuf>,
    seen_defines: BTreeSet<String>,
}

impl CompilePlan {
    fn with_file(mut self, file: &SourceFile, caps: &Capabilities) -> Result<Self, BuildError> {
        if !caps.supports(file.dialect) {
            return Err(BuildError::UnsupportedFileType {
                path: file.path.clone(),
                dialect: file.dialect,
            });
        }
        self.files.push(file.path.clone());

        for dir in &file.include_dirs {
            if self.seen_includes.insert(dir.clone()) {
                self.include_flags.push(format!("-I{}", dir.display()));
            }
        }
        for (name, value) in &file.defines {
            if self.seen_defines.insert(name.clone()) {
                self.define_flags.push(format!("-D{name}={value}"));
            }
        }
        if let Some(esc) = &caps.escalation {
            self.escalate |= file.dialect == esc.dialect;
        }
        Ok(self)
    }
}

/// Folds `files` into a [`CompilePlan`].
///
/// Fails on the first file whose dialect the toolchain does not support.
pub fn plan_compile(files: &[&SourceFile], caps: &Capabilities) -> Result<CompilePlan, BuildError> {
    files
        .iter()
        .try_fold(CompilePlan::default(), |plan, file| plan.with_file(file, caps))
}

/// A fully synthesized compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
    /// Program, target, file list, library, include and define flags.
    pub compile_args: Vec<String>,
    /// `-o <binary>`.
    pub output_args: Vec<String>,
    /// The file list written for this invocation.
    pub file_list: PathBuf,
    /// Path of the binary the compiler produces.
    pub binary: PathBuf,
}

impl CompileInvocation {
    /// The complete command line, `param_args` appended last.
    pub fn command(&self, param_args: &[String]) -> Vec<String> {
        let mut args = self.compile_args.clone();
        args.extend(self.output_args.iter().cloned());
        args.extend(param_args.iter().cloned());
        args
    }
}

/// Builds the compile command for `files` and writes the file list to
/// `output_dir`.
///
/// `compiler` is the program to run, usually a path ending in
/// [`Capabilities::compiler`]. Each entry of `library_files` becomes one
/// `-l` flag. The dialect of every file is validated before anything is
/// written.
pub fn synthesize_compile(
    files: &[&SourceFile],
    library_files: &[PathBuf],
    output_dir: &Path,
    compiler: &str,
    caps: &Capabilities,
) -> Result<CompileInvocation, BuildError> {
    let plan = plan_compile(files, caps)?;
    let file_list = output_dir.join(FILE_LIST_NAME);

    let mut contents = String::new();
    for path in &plan.files {
        info!(file = %path.display(), "adding to compilation file list");
        contents.push_str(&path.to_string_lossy());
        contents.push('\n');
    }
    std::fs::write(&file_list, contents).map_err(|source| BuildError::FileList {
        path: file_list.clone(),
        source,
    })?;

    let mut compile_args = vec![compiler.to_string(), caps.target_flag.clone()];
    if plan.escalate {
        if let Some(esc) = &caps.escalation {
            compile_args.push(esc.flag.clone());
        }
    }
    compile_args.push("-c".to_string());
    compile_args.push(file_list.to_string_lossy().into_owned());
    compile_args.extend(library_files.iter().map(|lib| format!("-l{}", lib.display())));
    compile_args.extend(plan.include_flags);
    compile_args.extend(plan.define_flags);

    let binary = output_dir.join(&caps.name);
    Ok(CompileInvocation {
        compile_args,
        output_args: vec!["-o".to_string(), binary.to_string_lossy().into_owned()],
        file_list,
        binary,
    })
}

/// One `-P <unit>.<name>=<value>` pair per generic, in key order.
///
/// The value of [`Capabilities::quoted_generic`] is wrapped in double quotes.
pub fn synthesize_generics(
    generics: &BTreeMap<String, String>,
    unit: &str,
    caps: &Capabilities,
) -> Vec<String> {
    let mut args = Vec::with_capacity(generics.len() * 2);
    for (name, value) in generics {
        args.push("-P".to_string());
        if caps.quoted_generic.as_deref() == Some(name.as_str()) {
            args.push(format!("{unit}.{name}=\"{value}\""));
        } else {
            args.push(format!("{unit}.{name}={value}"));
        }
    }
    args
}

/// The runtime command: program, fixed flags, waveform flag, caller flags,
/// then the binary.
pub fn synthesize_simulate(
    runtime: &str,
    binary: &Path,
    waveform: WaveformFormat,
    flags: &[String],
    caps: &Capabilities,
) -> Vec<String> {
    let mut args = vec![runtime.to_string()];
    args.extend(caps.runtime_flags.iter().cloned());
    args.extend(waveform.vvp_flag().map(str::to_string));
    args.extend(flags.iter().cloned());
    args.push(binary.to_string_lossy().into_owned());
    args
}
