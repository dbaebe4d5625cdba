//! What a simulator toolchain can do, as a plain value.

use crate::version::Version;
use ivy_project::Dialect;

/// A global compile flag switched on when any resolved file uses `dialect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalation {
    /// The dialect that triggers the flag.
    pub dialect: Dialect,
    /// The flag passed to the compiler.
    pub flag: String,
}

/// Immutable description of a compiler/runtime pair.
///
/// The invocation synthesizer reads every toolchain-specific flag from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Short toolchain name; also the compiled binary's file name.
    pub name: String,
    /// Compiler program name.
    pub compiler: String,
    /// Runtime program name.
    pub runtime: String,
    /// Oldest supported version.
    pub min_version: Version,
    /// Dialects the compiler accepts.
    pub dialects: Vec<Dialect>,
    /// Language standard flag for newer dialects.
    pub escalation: Option<Escalation>,
    /// Compile target selection flag.
    pub target_flag: String,
    /// Flag printing the toolchain version.
    pub version_flag: String,
    /// Flags the runtime always receives before the waveform flag.
    pub runtime_flags: Vec<String>,
    /// Generic whose value is wrapped in double quotes.
    pub quoted_generic: Option<String>,
    /// Whether the runtime can open an interactive viewer.
    pub supports_gui: bool,
}

impl Capabilities {
    /// Icarus Verilog: `iverilog` compiling to `vvp`.
    pub fn icarus() -> Self {
        Self {
            name: "icarus".to_string(),
            compiler: "iverilog".to_string(),
            runtime: "vvp".to_string(),
            min_version: Version::new(10, 2, 0),
            dialects: vec![Dialect::Verilog, Dialect::SystemVerilog],
            escalation: Some(Escalation {
                dialect: Dialect::SystemVerilog,
                flag: "-g2012".to_string(),
            }),
            target_flag: "-tvvp".to_string(),
            version_flag: "-V".to_string(),
            runtime_flags: vec!["-n".to_string()],
            quoted_generic: Some("runner_cfg".to_string()),
            supports_gui: false,
        }
    }

    /// Replaces the minimum version.
    pub fn with_min_version(mut self, min_version: Version) -> Self {
        self.min_version = min_version;
        self
    }

    /// Returns true if the compiler accepts `dialect`.
    pub fn supports(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }
}
