//! The process execution seam.

use std::io;
use std::path::Path;

/// What a finished process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns true if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs toolchain programs on behalf of the build core.
///
/// `args[0]` is the program; the rest are its arguments. An `Err` means the
/// program could not be started at all.
pub trait ProcessRunner {
    /// Runs `args` to completion in `cwd`.
    fn run(&self, args: &[String], cwd: &Path) -> io::Result<ProcessOutput>;

    /// Runs `args` in the current directory and returns its standard output
    /// followed by its standard error.
    fn capture(&self, args: &[String]) -> io::Result<String> {
        let output = self.run(args, Path::new("."))?;
        Ok(output.stdout + &output.stderr)
    }
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, args: &[String], cwd: &Path) -> io::Result<ProcessOutput> {
        (**self).run(args, cwd)
    }

    fn capture(&self, args: &[String]) -> io::Result<String> {
        (**self).capture(args)
    }
}
