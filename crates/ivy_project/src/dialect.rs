//! HDL language dialects recognised by the project model.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// HDL language dialect detected from a file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Verilog-2005 (`.v`, `.vh`).
    Verilog,
    /// SystemVerilog (`.sv`, `.svh`).
    SystemVerilog,
    /// VHDL (`.vhd`, `.vhdl`).
    Vhdl,
    /// Any other extension.
    Unknown,
}

impl Dialect {
    /// Detects the dialect from a file's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("v" | "vh") => Dialect::Verilog,
            Some("sv" | "svh") => Dialect::SystemVerilog,
            Some("vhd" | "vhdl") => Dialect::Vhdl,
            _ => Dialect::Unknown,
        }
    }

    /// Returns true for the compilable (non-header) extensions picked up
    /// when a library source entry names a directory.
    pub fn is_compilable_extension(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("v" | "sv" | "vhd" | "vhdl")
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Verilog => "verilog",
            Dialect::SystemVerilog => "systemverilog",
            Dialect::Vhdl => "vhdl",
            Dialect::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
