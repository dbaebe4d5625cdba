//! Source discovery from the `[[libraries]]` tables of `ivy.toml`.

use crate::dialect::Dialect;
use crate::error::ProjectError;
use crate::file_id::FileId;
use crate::scanner::scan_source;
use crate::source_file::SourceFile;
use ivy_config::{LibraryConfig, ProjectConfig};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Loads every source file declared by the project's libraries.
///
/// Library entries are processed in declaration order. A directory entry
/// contributes its compilable HDL files (sorted by path); a file entry is
/// taken as-is whatever its extension. Paths are made absolute. A file that
/// is reachable from several entries is loaded once, for the first library
/// that lists it.
pub fn discover_sources(
    config: &ProjectConfig,
    project_dir: &Path,
) -> Result<Vec<SourceFile>, ProjectError> {
    let root = canonical(project_dir)?;
    let mut seen = BTreeSet::new();
    let mut files = Vec::new();

    for library in &config.libraries {
        for path in library_paths(library, &root)? {
            if !seen.insert(path.clone()) {
                debug!(path = %path.display(), library = %library.name, "already loaded");
                continue;
            }
            let id = FileId::from_raw(files.len() as u32);
            files.push(load_source(id, path, library, &root)?);
        }
    }

    if files.is_empty() {
        warn!(project = %config.project.name, "no source files found");
    }
    Ok(files)
}

fn library_paths(library: &LibraryConfig, root: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    let mut paths = Vec::new();
    for entry in &library.sources {
        let path = root.join(entry);
        if path.is_dir() {
            let mut found = Vec::new();
            for item in WalkDir::new(&path).sort_by_file_name() {
                let item = item.map_err(|e| ProjectError::Walk {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                if item.file_type().is_file() && Dialect::is_compilable_extension(item.path()) {
                    found.push(canonical(item.path())?);
                }
            }
            found.sort();
            paths.extend(found);
        } else if path.is_file() {
            paths.push(canonical(&path)?);
        } else {
            return Err(ProjectError::MissingSource {
                library: library.name.clone(),
                path,
            });
        }
    }
    Ok(paths)
}

fn load_source(
    id: FileId,
    path: PathBuf,
    library: &LibraryConfig,
    root: &Path,
) -> Result<SourceFile, ProjectError> {
    let mut file = SourceFile::new(id, path, library.name.clone());
    file.include_dirs = library.include_dirs.iter().map(|d| root.join(d)).collect();
    file.defines = library.defines.clone();

    if file.dialect != Dialect::Unknown {
        let bytes = std::fs::read(&file.path).map_err(|source| ProjectError::Io {
            path: file.path.clone(),
            source,
        })?;
        let scan = scan_source(&String::from_utf8_lossy(&bytes), file.dialect);
        file.units = scan.units;
        file.uses = scan.uses;
    }
    debug!(
        path = %file.path.display(),
        dialect = %file.dialect,
        units = ?file.units,
        "loaded source"
    );
    Ok(file)
}

fn canonical(path: &Path) -> Result<PathBuf, ProjectError> {
    std::fs::canonicalize(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivy_config::load_config_from_str;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn directories_are_walked_in_path_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/b.v", "module b; endmodule");
        write(tmp.path(), "src/a.v", "module a; endmodule");
        write(tmp.path(), "src/defs.vh", "`define X 1");
        write(tmp.path(), "src/readme.md", "module not_hdl; endmodule");
        let config = load_config_from_str(
            r#"
[project]
name = "p"

[[libraries]]
name = "lib"
sources = ["src"]
include_dirs = ["src"]

[libraries.defines]
X = 1
"#,
        )
        .unwrap();

        let files = discover_sources(&config, tmp.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.units[0].as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(files.iter().all(|f| f.path.is_absolute()));
        assert_eq!(files[1].id, FileId::from_raw(1));
        assert_eq!(files[0].defines["X"], "1");
        assert!(files[0].include_dirs[0].ends_with("src"));
    }

    #[test]
    fn overlapping_entries_load_once() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.v", "module a; endmodule");
        write(tmp.path(), "src/tb/a_tb.sv", "module a_tb; a dut(); endmodule");
        let config = load_config_from_str(
            r#"
[project]
name = "p"

[[libraries]]
name = "tb_lib"
sources = ["src/tb"]

[[libraries]]
name = "lib"
sources = ["src"]
"#,
        )
        .unwrap();

        let files = discover_sources(&config, tmp.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].library, "tb_lib");
        assert_eq!(files[1].library, "lib");
        assert!(files[0].uses.contains("a"));
    }

    #[test]
    fn explicit_file_of_unknown_type_is_kept() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "gen/netlist.edf", "(edif netlist)");
        let config = load_config_from_str(
            r#"
[project]
name = "p"

[[libraries]]
name = "lib"
sources = ["gen/netlist.edf"]
"#,
        )
        .unwrap();

        let files = discover_sources(&config, tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].dialect, Dialect::Unknown);
        assert!(files[0].units.is_empty());
    }

    #[test]
    fn missing_source_errors() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_from_str(
            r#"
[project]
name = "p"

[[libraries]]
name = "lib"
sources = ["nope"]
"#,
        )
        .unwrap();

        let err = discover_sources(&config, tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::MissingSource { ref library, .. } if library == "lib"));
    }
}
