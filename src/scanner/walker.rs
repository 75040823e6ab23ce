//! Sequential directory walker that collects files by name suffix.
//!
//! Used twice per sweep: once per asset category (case-insensitive suffixes,
//! rooted at the category's directories) and once for the reference corpus
//! (case-sensitive suffixes, rooted at the project root). Every returned file
//! carries two paths: the display path (configured root joined with the walked
//! relative path, e.g. `img/ui/button.png`) used for matching output and
//! ordering, and the on-disk location resolved against the project root.

#![allow(missing_docs)]

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// How file name suffixes are compared against the configured extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixMatch {
    /// Lowercase the file name first; extensions are expected lowercase.
    CaseInsensitive,
    /// Compare the file name exactly as stored on disk.
    CaseSensitive,
}

/// Walker configuration derived from `Config`.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Directory every root is resolved against.
    pub base: PathBuf,
    pub root_paths: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub suffix_match: SuffixMatch,
}

impl WalkerConfig {
    /// Whether `name` ends with one of the configured extensions.
    pub fn accepts(&self, name: &str) -> bool {
        match self.suffix_match {
            SuffixMatch::CaseInsensitive => {
                let lowered = name.to_lowercase();
                self.extensions.iter().any(|ext| lowered.ends_with(ext.as_str()))
            }
            SuffixMatch::CaseSensitive => {
                self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
            }
        }
    }
}

/// A file discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Configured root joined with the relative path below it.
    pub path: PathBuf,
    /// Where the file actually lives (`base` joined with `path`).
    pub location: PathBuf,
}

impl WalkedFile {
    /// Final path segment, including its extension.
    ///
    /// `None` when the name is not valid UTF-8: such a name can never occur in
    /// decoded text.
    pub fn base_name(&self) -> Option<&str> {
        self.path.file_name().and_then(OsStr::to_str)
    }
}

/// A directory the walk could not read and therefore left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDirectory {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub error: String,
}

/// Everything one walk produced.
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Matching files, sorted by the raw bytes of their display path and free
    /// of duplicates.
    pub files: Vec<WalkedFile>,
    pub skipped: Vec<SkippedDirectory>,
}

/// Item on the traversal stack: (display directory, on-disk directory).
type WorkItem = (PathBuf, PathBuf);

/// Depth-first walker over a fixed set of roots.
///
/// - Roots that do not exist (or are not directories) contribute nothing.
/// - Directory symlinks are listed but never descended into.
/// - Unreadable directories are recorded in [`WalkOutcome::skipped`] and the
///   walk continues with the remaining work.
pub struct FileWalker {
    config: WalkerConfig,
}

impl FileWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Walk every root to completion.
    pub fn walk(&self) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let mut stack: Vec<WorkItem> = Vec::new();

        for root in &self.config.root_paths {
            let location = self.config.base.join(root);
            match fs::metadata(&location) {
                Ok(meta) if meta.is_dir() => stack.push((root.clone(), location)),
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => outcome.skipped.push(SkippedDirectory {
                    path: root.clone(),
                    kind: err.kind(),
                    error: err.to_string(),
                }),
            }

            while let Some((display, dir)) = stack.pop() {
                self.process_directory(&display, &dir, &mut stack, &mut outcome);
            }
        }

        outcome
            .files
            .sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        outcome.files.dedup_by(|a, b| a.path == b.path);
        outcome
    }

    fn process_directory(
        &self,
        display: &Path,
        dir: &Path,
        stack: &mut Vec<WorkItem>,
        outcome: &mut WalkOutcome,
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                outcome.skipped.push(SkippedDirectory {
                    path: display.to_path_buf(),
                    kind: err.kind(),
                    error: err.to_string(),
                });
                return;
            }
        };

        for entry_result in entries {
            let Ok(entry) = entry_result else {
                continue;
            };
            let Ok(ft) = entry.file_type() else {
                continue;
            };

            let name = entry.file_name();
            let child_display = display.join(&name);
            let child_location = entry.path();

            if ft.is_dir() {
                stack.push((child_display, child_location));
                continue;
            }

            // Links to directories are not followed; anything else (including
            // dangling links) is treated as a file.
            if ft.is_symlink()
                && fs::metadata(&child_location).is_ok_and(|m| m.is_dir())
            {
                continue;
            }

            if self.config.accepts(&name.to_string_lossy()) {
                outcome.files.push(WalkedFile {
                    path: child_display,
                    location: child_location,
                });
            }
        }
    }
}
