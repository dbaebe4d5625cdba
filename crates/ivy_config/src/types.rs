//! Configuration types deserialized from `ivy.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `ivy.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Toolchain location and version requirements.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// HDL libraries and the source files that belong to them.
    #[serde(default)]
    pub libraries: Vec<LibraryConfig>,
    /// Parameter overrides applied to every test run.
    #[serde(default, deserialize_with = "deserialize_scalar_map")]
    pub generics: BTreeMap<String, String>,
    /// Simulator settings.
    #[serde(default)]
    pub sim: SimSettings,
}

/// Core project metadata required in every `ivy.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Directory (relative to the project root) for compile artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "ivy_out".to_string()
}

/// Where the toolchain lives and which version it must be.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolchainConfig {
    /// Directory containing `iverilog` and `vvp`. When absent, `PATH` is searched.
    pub prefix: Option<String>,
    /// Minimum supported version (e.g. `"10.2"` or `"11.0.1"`).
    pub min_version: Option<String>,
    /// Verilog library files handed to the compiler with `-l`.
    #[serde(default)]
    pub library_files: Vec<String>,
}

/// A named HDL library and its source files.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// The library name.
    pub name: String,
    /// Source files or directories. Directories are walked recursively.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub sources: Vec<String>,
    /// Include directories attached to every file of this library.
    #[serde(default)]
    pub include_dirs: Vec<String>,
    /// Preprocessor defines attached to every file of this library.
    #[serde(default, deserialize_with = "deserialize_scalar_map")]
    pub defines: BTreeMap<String, String>,
}

/// Simulator settings from the `[sim]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimSettings {
    /// Extra flags passed to `vvp` before the compiled binary.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub vvp_flags: Vec<String>,
    /// Waveform dump format requested from `vvp`.
    #[serde(default)]
    pub waveform: WaveformFormat,
    /// Build the simulation binary without running it.
    #[serde(default)]
    pub elaborate_only: bool,
    /// Which files outside the top-level's dependency closure are compiled.
    #[serde(default)]
    pub closure: ClosureMode,
}

/// Waveform output format for `vvp` dumps.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaveformFormat {
    /// LXT2 (default).
    #[default]
    Lxt2,
    /// LXT.
    Lxt,
    /// Value Change Dump (IEEE 1364).
    Vcd,
    /// Fast Signal Trace.
    Fst,
    /// No waveform flag is passed.
    #[serde(rename = "none")]
    Disabled,
}

impl WaveformFormat {
    /// The `vvp` flag selecting this format, if any.
    pub fn vvp_flag(self) -> Option<&'static str> {
        match self {
            WaveformFormat::Lxt2 => Some("-lxt2"),
            WaveformFormat::Lxt => Some("-lxt"),
            WaveformFormat::Vcd => Some("-vcd"),
            WaveformFormat::Fst => Some("-fst"),
            WaveformFormat::Disabled => None,
        }
    }
}

/// How the compile set is derived from the requested top-level.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ClosureMode {
    /// Only the transitive dependencies of the top-level file.
    #[default]
    Strict,
    /// The dependency closure plus every file that is not itself a root.
    ///
    /// Covers dependencies the unit scanner cannot see, such as modules
    /// instantiated through macros.
    RetainNonTop,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `vvp_flags = "-v"` as well as `vvp_flags = ["-v", "-N"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// A TOML scalar normalised to its textual form.
///
/// Parameter and define values are opaque strings to the toolchain, but
/// writing `D_WIDTH = 10` in TOML is more natural than `D_WIDTH = "10"`.
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a string, integer, float or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

fn deserialize_scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.0)).collect())
}
