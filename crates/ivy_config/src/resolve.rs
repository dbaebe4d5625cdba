//! Run resolution: merging project settings with command-line overrides.

use crate::error::ConfigError;
use crate::types::{ClosureMode, ProjectConfig, WaveformFormat};
use std::collections::BTreeMap;

/// Overrides supplied on the command line for a single invocation.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    /// `NAME=VALUE` parameter overrides, already split.
    pub generics: Vec<(String, String)>,
    /// Extra `vvp` flags appended after the configured ones.
    pub vvp_flags: Vec<String>,
    /// Force elaborate-only mode.
    pub elaborate_only: bool,
    /// Force [`ClosureMode::RetainNonTop`].
    pub retain_non_top: bool,
}

/// Fully resolved run settings with project and command-line values merged.
///
/// Project generics form the base and command-line generics overlay them.
/// Command-line `vvp` flags follow the configured flags.
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    /// Merged parameter overrides.
    pub generics: BTreeMap<String, String>,
    /// Merged `vvp` flags, in order.
    pub vvp_flags: Vec<String>,
    /// Waveform format requested from `vvp`.
    pub waveform: WaveformFormat,
    /// Whether to stop after building the simulation binary.
    pub elaborate_only: bool,
    /// How the compile set is derived.
    pub closure: ClosureMode,
}

/// Merges the `[generics]` and `[sim]` tables of `config` with `overrides`.
pub fn resolve_run_settings(config: &ProjectConfig, overrides: &RunOverrides) -> ResolvedRun {
    let mut generics = config.generics.clone();
    for (name, value) in &overrides.generics {
        generics.insert(name.clone(), value.clone());
    }

    let mut vvp_flags = config.sim.vvp_flags.clone();
    vvp_flags.extend(overrides.vvp_flags.iter().cloned());

    let closure = if overrides.retain_non_top {
        ClosureMode::RetainNonTop
    } else {
        config.sim.closure
    };

    ResolvedRun {
        generics,
        vvp_flags,
        waveform: config.sim.waveform,
        elaborate_only: config.sim.elaborate_only || overrides.elaborate_only,
        closure,
    }
}

/// Splits a `NAME=VALUE` command-line generic.
///
/// The value may itself contain `=`; only the first one separates.
pub fn parse_generic_override(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::ValidationError(format!(
            "generic override '{s}' is not of the form NAME=VALUE"
        ))),
    }
}
