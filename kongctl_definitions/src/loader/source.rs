//! Source enumeration: `-f/--filename` parsing and directory walking
//! (§4.C), via `walkdir`, the teacher's filesystem-feature dependency.

use std::path::{Path, PathBuf};

use crate::error::configuration;
use crate::Result;

#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Directory(PathBuf),
    Stdin,
}

/// Splits a comma-separated `-f` value and auto-detects each entry's kind.
/// `-` means stdin.
pub fn parse_sources(filenames: &str) -> Vec<Source> {
    filenames
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s == "-" {
                Source::Stdin
            } else if Path::new(s).is_dir() {
                Source::Directory(PathBuf::from(s))
            } else {
                Source::File(PathBuf::from(s))
            }
        })
        .collect()
}

/// One concrete file to read, or stdin. `label` is used in error messages
/// and duplicate-ref diagnostics.
#[derive(Debug, Clone)]
pub enum InputFile {
    Path(PathBuf),
    Stdin,
}

impl InputFile {
    pub fn label(&self) -> String {
        match self {
            InputFile::Path(p) => p.display().to_string(),
            InputFile::Stdin => "<stdin>".to_string(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        match self {
            InputFile::Path(p) => p.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
            InputFile::Stdin => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

fn has_yaml_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Expands one `Source` into the ordered list of files it contributes.
pub fn enumerate(source: &Source, recursive: bool) -> Result<Vec<InputFile>> {
    match source {
        Source::Stdin => Ok(vec![InputFile::Stdin]),
        Source::File(path) => {
            if !has_yaml_extension(path) {
                return Err(configuration(format!(
                    "{} does not have a .yaml or .yml extension",
                    path.display()
                )));
            }
            Ok(vec![InputFile::Path(path.clone())])
        }
        Source::Directory(dir) => {
            let mut files = Vec::new();
            let walker = walkdir::WalkDir::new(dir).min_depth(1).max_depth(if recursive { usize::MAX } else { 1 });
            for entry in walker {
                let entry = entry.map_err(|e| configuration(format!("error walking {}: {}", dir.display(), e)))?;
                if entry.file_type().is_file() && has_yaml_extension(entry.path()) {
                    files.push(InputFile::Path(entry.path().to_path_buf()));
                }
            }
            files.sort_by_key(|f| f.label());
            if files.is_empty() {
                let has_subdirs = std::fs::read_dir(dir)
                    .map(|mut it| it.any(|e| e.map(|e| e.path().is_dir()).unwrap_or(false)))
                    .unwrap_or(false);
                if has_subdirs && !recursive {
                    warn!(
                        "{} contains subdirectories but -R/--recursive was not set; no files were loaded",
                        dir.display()
                    );
                }
            }
            Ok(files)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_detects_stdin() {
        let sources = parse_sources("a.yaml,-,b.yaml");
        assert!(matches!(sources[0], Source::File(_)));
        assert!(matches!(sources[1], Source::Stdin));
        assert!(matches!(sources[2], Source::File(_)));
    }

    #[test]
    fn detects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sources = parse_sources(dir.path().to_str().unwrap());
        assert!(matches!(sources[0], Source::Directory(_)));
    }
}
