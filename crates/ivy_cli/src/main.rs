//! Ivy CLI: build and run Icarus Verilog testbenches.
//!
//! Provides `ivy run` for compiling and simulating top-levels, `ivy list` and
//! `ivy order` for inspecting the project's dependency graph, and
//! `ivy version` for checking the installed toolchain.

#![warn(missing_docs)]

mod list;
mod order;
mod pipeline;
mod run;
mod version;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Ivy: dependency-ordered builds for Icarus Verilog.
#[derive(Parser, Debug)]
#[command(name = "ivy", version, about = "Icarus Verilog build driver")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `ivy.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and simulate one or more top-levels.
    Run(RunArgs),
    /// List every top-level of the project.
    List(ListArgs),
    /// Print the compile order for a top-level.
    Order(OrderArgs),
    /// Report the installed toolchain version.
    Version,
}

/// Arguments for the `ivy run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Top-level names to run. Runs every top-level when omitted.
    pub tops: Vec<String>,

    /// Compile only; do not start the simulation.
    #[arg(long)]
    pub elaborate_only: bool,

    /// Also compile files that are not top-levels but are outside the
    /// dependency closure.
    #[arg(long)]
    pub retain_non_top: bool,

    /// Open the simulation in an interactive viewer.
    #[arg(long)]
    pub gui: bool,

    /// Parameter override applied to each top-level (e.g., `-g D_WIDTH=10`).
    #[arg(short = 'g', long = "generic", value_name = "NAME=VALUE", value_parser = parse_generic)]
    pub generics: Vec<(String, String)>,

    /// Extra flag passed to `vvp` (repeatable).
    #[arg(long = "vvp-flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub vvp_flags: Vec<String>,
}

/// Arguments for the `ivy list` subcommand.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `ivy order` subcommand.
#[derive(Parser, Debug)]
pub struct OrderArgs {
    /// Top-level name.
    pub top: String,

    /// Include non-top-level files outside the dependency closure.
    #[arg(long)]
    pub retain_non_top: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn parse_generic(s: &str) -> Result<(String, String), ivy_config::ConfigError> {
    ivy_config::parse_generic_override(s)
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// level chosen by `--quiet`/`--verbose`.
fn init_logging(global: &GlobalArgs) {
    let default = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(global.verbose)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::List(ref args) => list::run(args, &global),
        Command::Order(ref args) => order::run(args, &global),
        Command::Version => version::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
