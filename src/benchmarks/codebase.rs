//! @ai:module:intent Read-only snapshot of a codebase's source files and size
//! @ai:module:layer infrastructure
//! @ai:module:public_api Codebase, SourceFile, triple_quoted_mask
//! @ai:module:stateless true

use crate::error::{BenchError, Result};
use crate::stats::{classify, count_non_blank_lines, SizeBucket};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never treated as part of the codebase.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".venv",
    "venv",
    "node_modules",
    "__pycache__",
    "target",
];

const TRIPLE_QUOTES: [&str; 2] = ["\"\"\"", "'''"];

/// @ai:intent One source file loaded into memory
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    /// @ai:intent Path relative to the codebase root, for details lines
    /// @ai:effects pure
    pub fn display_path(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .display()
            .to_string()
    }

    /// @ai:intent Numbered lines (1-based) that do not start inside a triple-quoted string
    /// @ai:effects pure
    pub fn code_lines(&self) -> Vec<(usize, &str)> {
        self.content
            .lines()
            .zip(triple_quoted_mask(&self.content))
            .enumerate()
            .filter(|(_, (_, inside))| !inside)
            .map(|(index, (line, _))| (index + 1, line))
            .collect()
    }

    /// @ai:intent File name looks like a pytest test module
    /// @ai:effects pure
    pub fn is_test_file(&self) -> bool {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains("test"))
            .unwrap_or(false)
    }
}

/// @ai:intent Source files of one codebase plus its size classification
/// @ai:invariant size_bucket == classify(line_count)
#[derive(Debug, Clone)]
pub struct Codebase {
    pub root: PathBuf,
    pub files: Vec<SourceFile>,
    pub line_count: usize,
    pub size_bucket: SizeBucket,
}

impl Codebase {
    /// @ai:intent Walk the tree and load every file with a matching extension
    /// @ai:pre root is an existing directory
    /// @ai:post files are sorted by path
    /// @ai:edge_cases unreadable or non-UTF-8 files are skipped with a warning
    /// @ai:effects fs:read
    pub fn scan(root: &Path, extensions: &[String]) -> Result<Self> {
        if !root.is_dir() {
            return Err(BenchError::Config(format!(
                "Codebase path '{}' is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                continue;
            }
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => files.push(SourceFile {
                    path: entry.path().to_path_buf(),
                    content,
                }),
                Err(e) => {
                    tracing::warn!("Skipping unreadable file {}: {}", entry.path().display(), e)
                }
            }
        }

        Ok(Self::from_files(root.to_path_buf(), files))
    }

    /// @ai:intent Build a snapshot from files already in memory
    /// @ai:effects pure
    pub fn from_files(root: PathBuf, files: Vec<SourceFile>) -> Self {
        let line_count = files
            .iter()
            .map(|f| count_non_blank_lines(&f.content))
            .sum();
        Self {
            root,
            files,
            line_count,
            size_bucket: classify(line_count),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn test_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.is_test_file())
    }
}

/// @ai:intent Per line, whether it begins inside a triple-quoted string
/// @ai:edge_cases quotes inside comments or single-quoted strings are not told apart
/// @ai:effects pure
pub fn triple_quoted_mask(source: &str) -> Vec<bool> {
    let mut open: Option<&str> = None;
    source
        .lines()
        .map(|line| {
            let inside = open.is_some();
            let mut rest = line;
            loop {
                let next = match open {
                    Some(delim) => rest.find(delim).map(|at| (at, delim)),
                    None => TRIPLE_QUOTES
                        .iter()
                        .filter_map(|delim| rest.find(delim).map(|at| (at, *delim)))
                        .min_by_key(|(at, _)| *at),
                };
                let Some((at, delim)) = next else {
                    break;
                };
                open = match open {
                    Some(_) => None,
                    None => Some(delim),
                };
                rest = &rest[at + delim.len()..];
            }
            inside
        })
        .collect()
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && IGNORED_DIRS
            .iter()
            .any(|dir| entry.file_name().to_string_lossy() == *dir)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}
