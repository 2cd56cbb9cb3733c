//! File discovery: walks a root directory and applies the configured
//! include/exclude glob lists on top of gitignore handling.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

pub struct FileWalker {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

#[derive(Debug, thiserror::Error)]
pub enum WalkerError {
    #[error("bad glob pattern '{pattern}': {message}")]
    BadPattern { pattern: String, message: String },
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, WalkerError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| WalkerError::BadPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| WalkerError::BadPattern {
        pattern: String::new(),
        message: e.to_string(),
    })
}

impl FileWalker {
    pub fn new(root: &Path, include: &[String], exclude: &[String]) -> Result<Self, WalkerError> {
        Ok(Self {
            root: root.to_path_buf(),
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    /// Walk the root and return matching files, respecting gitignore.
    /// Results are sorted so passes are deterministic.
    pub fn walk(&self) -> Vec<PathBuf> {
        let mut entries = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.into_path();
            if self.matches(&path) {
                entries.push(path);
            }
        }

        entries.sort();
        entries
    }

    /// Whether a single path passes the include/exclude lists. The watcher
    /// reuses this for event filtering.
    pub fn matches(&self, path: &Path) -> bool {
        // Globs are written against root-relative forward-slash paths.
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if self.exclude.is_match(relative) {
            return false;
        }
        // `**/*.ts` style globs also need to match bare `a.ts` at the root.
        self.include.is_match(relative)
            || relative
                .file_name()
                .is_some_and(|name| self.include.is_match(Path::new(name)))
    }
}
